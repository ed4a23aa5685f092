//! Error types shared by homevault crates.

/// Errors from one assistant ask cycle.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The request never completed (DNS failure, connection reset, body read failure).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The proxy answered with a non-success status.
    #[error("http {status}: {}", .message.as_deref().unwrap_or("unknown error"))]
    Http {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response body, when present.
        message: Option<String>,
    },
    /// The response stream could not be decoded.
    #[error("stream error: {0}")]
    Stream(String),
    /// The accumulated answer exceeded the configured cap.
    #[error("answer exceeded {limit} bytes")]
    AnswerTooLarge {
        /// Configured maximum answer length in bytes.
        limit: usize,
    },
    /// The session was closed while the answer was streaming.
    #[error("cancelled")]
    Cancelled,
}

impl AssistantError {
    /// Whether the failure happened below HTTP (no response was obtained or
    /// the body could not be read).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Stream(_))
    }

    /// The server-provided error string, if this is an HTTP failure that carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
