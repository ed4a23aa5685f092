//! Proxy configuration loaded from the environment.

use std::net::SocketAddr;

use thiserror::Error;

/// Default OpenAI-compatible gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev";

/// Default model for inventory questions.
pub const DEFAULT_ASK_MODEL: &str = "google/gemini-3-flash-preview";

/// Default model for photo identification.
pub const DEFAULT_IDENTIFY_MODEL: &str = "google/gemini-2.5-flash";

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8787";

/// Errors from loading [`ProxyConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The listen address could not be parsed.
    #[error("invalid listen address {value:?}: {source}")]
    InvalidAddr {
        /// The raw value that failed to parse.
        value: String,
        /// Underlying parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The gateway URL is not an http(s) URL.
    #[error("invalid gateway url {0:?}: expected http:// or https://")]
    InvalidGatewayUrl(String),
}

/// Runtime settings for the proxy binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Gateway bearer key. Missing keys are reported per request.
    pub api_key: Option<String>,
    /// Gateway base URL without a trailing slash.
    pub gateway_url: String,
    /// Model used by `ask-assistant`.
    pub ask_model: String,
    /// Model used by `identify-image`.
    pub identify_model: String,
    /// Socket address to listen on.
    pub listen_addr: SocketAddr,
}

impl ProxyConfig {
    /// Load from process environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `AI_GATEWAY_API_KEY` | unset |
    /// | `AI_GATEWAY_URL` | [`DEFAULT_GATEWAY_URL`] |
    /// | `ASK_ASSISTANT_MODEL` | [`DEFAULT_ASK_MODEL`] |
    /// | `IDENTIFY_IMAGE_MODEL` | [`DEFAULT_IDENTIFY_MODEL`] |
    /// | `HOMEVAULT_PROXY_ADDR` | [`DEFAULT_LISTEN_ADDR`] |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gateway_url = get("AI_GATEWAY_URL")
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(gateway_url.starts_with("http://") || gateway_url.starts_with("https://")) {
            return Err(ConfigError::InvalidGatewayUrl(gateway_url));
        }

        let addr = get("HOMEVAULT_PROXY_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = addr
            .parse()
            .map_err(|source| ConfigError::InvalidAddr {
                value: addr.clone(),
                source,
            })?;

        Ok(Self {
            api_key: get("AI_GATEWAY_API_KEY"),
            gateway_url,
            ask_model: get("ASK_ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_ASK_MODEL.to_string()),
            identify_model: get("IDENTIFY_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IDENTIFY_MODEL.to_string()),
            listen_addr,
        })
    }
}
