//! Internal helpers for mapping HTTP/reqwest errors to [`AssistantError`].

use homevault_types::{AssistantError, ErrorBody};

/// Map a non-success proxy response to an [`AssistantError`].
///
/// The proxy answers failures with `{ "error": string }`; a missing or
/// unparsable body yields `message: None`.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> AssistantError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty());
    AssistantError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Map a [`reqwest::Error`] to an [`AssistantError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> AssistantError {
    AssistantError::Network(Box::new(err))
}
