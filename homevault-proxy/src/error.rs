//! Proxy error type and its HTTP rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use homevault_types::ErrorBody;
use thiserror::Error;

/// Errors surfaced by the proxy handlers.
///
/// Every variant renders as `{ "error": "<display text>" }`.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No gateway key was configured.
    #[error("AI_GATEWAY_API_KEY is not configured")]
    MissingApiKey,

    /// The request body could not be read as the expected JSON.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// The gateway could not be reached or its body could not be read.
    #[error("gateway request failed: {0}")]
    Gateway(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The gateway answered 429.
    #[error("Too many requests, try again later.")]
    RateLimited,

    /// The gateway answered 402.
    #[error("Payment required.")]
    PaymentRequired,

    /// The gateway answered some other non-success status.
    #[error("AI gateway error")]
    Upstream {
        /// Status returned by the gateway.
        status: u16,
    },
}

impl ProxyError {
    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            Self::MissingApiKey | Self::Gateway(_) | Self::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Map a gateway status to the matching [`ProxyError`].
pub(crate) fn map_gateway_status(status: reqwest::StatusCode) -> ProxyError {
    match status.as_u16() {
        429 => ProxyError::RateLimited,
        402 => ProxyError::PaymentRequired,
        other => ProxyError::Upstream { status: other },
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Gateway(Box::new(err))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
