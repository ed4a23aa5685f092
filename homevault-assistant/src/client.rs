//! HTTP client for the homevault edge functions.

use futures::Stream;
use homevault_types::{AskRequest, AssistantError};
use serde::{Deserialize, Serialize};

use crate::error::{map_http_status, map_reqwest_error};
use crate::streaming::{DecodedFrame, FrameStream, decode_stream};

/// Path of the streaming assistant function under the project URL.
const ASK_ASSISTANT_PATH: &str = "/functions/v1/ask-assistant";

/// Path of the photo identification function under the project URL.
const IDENTIFY_IMAGE_PATH: &str = "/functions/v1/identify-image";

/// Client for the `ask-assistant` and `identify-image` functions.
///
/// The project URL and key are passed in explicitly; nothing is read from
/// the process environment.
///
/// # Example
///
/// ```no_run
/// use homevault_assistant::AssistantClient;
///
/// let client = AssistantClient::new("https://project.example.co", "publishable-key");
/// ```
#[derive(Debug, Clone)]
pub struct AssistantClient {
    /// Project base URL, without trailing slash.
    pub(crate) base_url: String,
    /// Bearer credential for the functions.
    pub(crate) api_key: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

/// Streaming answer returned by [`AssistantClient::ask_stream`].
pub struct AnswerStream {
    /// Decoded frames. Consume with `StreamExt::next()`.
    pub frames: FrameStream,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyImageRequest<'a> {
    image_base64: &'a str,
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct IdentifyImageResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub(crate) fn ask_url(&self) -> String {
        format!("{}{ASK_ASSISTANT_PATH}", self.base_url)
    }

    pub(crate) fn identify_url(&self) -> String {
        format!("{}{IDENTIFY_IMAGE_PATH}", self.base_url)
    }

    /// Post a question and return the decoded answer stream.
    ///
    /// Fails with [`AssistantError::Network`] when no response is obtained and
    /// [`AssistantError::Http`] on a non-success status.
    pub async fn ask_stream(&self, request: &AskRequest) -> Result<AnswerStream, AssistantError> {
        let url = self.ask_url();
        tracing::debug!(url = %url, items = request.items.len(), "sending ask request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &body));
        }

        Ok(AnswerStream {
            frames: Box::pin(decode_stream(response.bytes_stream())),
        })
    }

    /// Ask for product name suggestions for a photo.
    ///
    /// `mime_type` defaults to `image/jpeg` on the server when empty.
    pub async fn identify_image(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<String>, AssistantError> {
        let url = self.identify_url();
        tracing::debug!(
            url = %url,
            mime_type,
            bytes = image_base64.len(),
            "sending identify request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&IdentifyImageRequest {
                image_base64,
                mime_type,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }

        let parsed: IdentifyImageResponse = serde_json::from_str(&body)
            .map_err(|e| AssistantError::Stream(format!("invalid suggestions body: {e}")))?;
        Ok(parsed.suggestions)
    }
}

impl Stream for AnswerStream {
    type Item = Result<DecodedFrame, AssistantError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.frames.as_mut().poll_next(cx)
    }
}
