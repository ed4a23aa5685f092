//! Client for the OpenAI-compatible chat-completion gateway.

use chrono::NaiveDate;
use homevault_types::AskRequest;
use serde_json::json;

use crate::config::{DEFAULT_ASK_MODEL, DEFAULT_GATEWAY_URL, DEFAULT_IDENTIFY_MODEL, ProxyConfig};
use crate::error::{ProxyError, map_gateway_status};
use crate::prompt::{
    IDENTIFY_SYSTEM_PROMPT, IDENTIFY_USER_PROMPT, ask_system_prompt, image_data_uri,
};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ContentPart, FunctionDef, FunctionName, ImageUrl,
    MessageContent, Suggestions, Tool, ToolChoice,
};

/// Name of the forced tool used for photo identification.
const SUGGEST_NAMES_TOOL: &str = "suggest_names";

/// Gateway client shared by the proxy handlers.
///
/// # Example
///
/// ```no_run
/// use homevault_proxy::GatewayClient;
///
/// let gateway = GatewayClient::new()
///     .api_key("gw-...")
///     .base_url("http://localhost:9999")
///     .ask_model("google/gemini-3-flash-preview");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// Bearer key; requests fail with [`ProxyError::MissingApiKey`] when unset.
    pub(crate) api_key: Option<String>,
    /// Gateway base URL.
    pub(crate) base_url: String,
    pub(crate) ask_model: String,
    pub(crate) identify_model: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayClient {
    /// Client with default URL and models and no key.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GATEWAY_URL.into(),
            ask_model: DEFAULT_ASK_MODEL.into(),
            identify_model: DEFAULT_IDENTIFY_MODEL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Client built from loaded configuration.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let client = Self::new()
            .base_url(config.gateway_url.clone())
            .ask_model(config.ask_model.clone())
            .identify_model(config.identify_model.clone());
        match &config.api_key {
            Some(key) => client.api_key(key.clone()),
            None => client,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the gateway base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn ask_model(mut self, model: impl Into<String>) -> Self {
        self.ask_model = model.into();
        self
    }

    pub fn identify_model(mut self, model: impl Into<String>) -> Self {
        self.identify_model = model.into();
        self
    }

    /// Build the chat completions endpoint URL.
    pub(crate) fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn key(&self) -> Result<&str, ProxyError> {
        self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response, ProxyError> {
        let key = self.key()?;
        let url = self.completions_url();
        tracing::debug!(
            url = %url,
            model = %body.model,
            stream = body.stream,
            "sending gateway request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %text,
            model = %body.model,
            "gateway error"
        );
        Err(map_gateway_status(status))
    }

    /// Start a streamed answer for `request`. The returned response body is
    /// the gateway's SSE stream.
    pub async fn stream_answer(
        &self,
        request: &AskRequest,
        today: NaiveDate,
    ) -> Result<reqwest::Response, ProxyError> {
        let body = ChatRequest {
            model: self.ask_model.clone(),
            messages: vec![
                ChatMessage::system(ask_system_prompt(&request.items, today)),
                ChatMessage::user(MessageContent::Text(request.question.clone())),
            ],
            stream: true,
            tools: Vec::new(),
            tool_choice: None,
        };
        self.send(&body).await
    }

    /// Ask the vision model for product name suggestions.
    ///
    /// A reply without a usable tool call yields an empty list.
    pub async fn suggest_names(
        &self,
        image_base64: &str,
        mime_type: Option<&str>,
    ) -> Result<Vec<String>, ProxyError> {
        let body = ChatRequest {
            model: self.identify_model.clone(),
            messages: vec![
                ChatMessage::system(IDENTIFY_SYSTEM_PROMPT),
                ChatMessage::user(MessageContent::Parts(vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_uri(mime_type, image_base64),
                        },
                    },
                    ContentPart::Text {
                        text: IDENTIFY_USER_PROMPT.into(),
                    },
                ])),
            ],
            stream: false,
            tools: vec![suggest_names_tool()],
            tool_choice: Some(ToolChoice {
                choice_type: "function",
                function: FunctionName {
                    name: SUGGEST_NAMES_TOOL,
                },
            }),
        };

        let response = self.send(&body).await?;
        let text = response.text().await?;
        let parsed: ChatResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable identify response");
                return Ok(Vec::new());
            }
        };
        let Some(arguments) = parsed.first_tool_arguments() else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Suggestions>(arguments) {
            Ok(args) => Ok(args.suggestions),
            Err(e) => {
                tracing::warn!(error = %e, "malformed suggest_names arguments");
                Ok(Vec::new())
            }
        }
    }
}

fn suggest_names_tool() -> Tool {
    Tool {
        tool_type: "function",
        function: FunctionDef {
            name: SUGGEST_NAMES_TOOL,
            description: "Return product name suggestions for the image",
            parameters: json!({
                "type": "object",
                "properties": {
                    "suggestions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "3-5 suggested product names in Hebrew"
                    }
                },
                "required": ["suggestions"],
                "additionalProperties": false
            }),
        },
    }
}
