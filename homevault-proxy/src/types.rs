//! Chat Completions wire types for the gateway and the proxy's own bodies.

use serde::{Deserialize, Serialize};

/// Chat Completions request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Request an SSE stream of deltas.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Force a specific tool call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// A message in Chat Completions format.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    /// "system" or "user".
    pub role: &'static str,
    /// Message content.
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Plain string or an array of content parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part user message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference; a `data:` URI for inline base64.
#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Function tool definition.
#[derive(Debug, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: FunctionDef,
}

#[derive(Debug, Serialize)]
pub struct FunctionDef {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema for the arguments.
    pub parameters: serde_json::Value,
}

/// `{ "type": "function", "function": { "name": ... } }`
#[derive(Debug, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub choice_type: &'static str,
    pub function: FunctionName,
}

#[derive(Debug, Serialize)]
pub struct FunctionName {
    pub name: &'static str,
}

/// Non-streaming Chat Completions response, reduced to what tool calls need.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    /// Arguments as a JSON string.
    pub arguments: String,
}

impl ChatResponse {
    /// Arguments of the first tool call of the first choice, if any.
    pub fn first_tool_arguments(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .tool_calls
            .as_ref()?
            .first()
            .map(|call| call.function.arguments.as_str())
    }
}

/// Body of `POST /identify-image`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyImageRequest {
    pub image_base64: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// `{ "suggestions": [...] }`, both the tool arguments and the endpoint reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub suggestions: Vec<String>,
}
