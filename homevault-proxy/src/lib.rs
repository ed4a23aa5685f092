//! HTTP proxy between homevault clients and an AI chat-completion gateway.
//!
//! Two endpoints, both under `/functions/v1/`:
//!
//! - `ask-assistant`: renders the user's items into a Hebrew system prompt
//!   and streams the gateway's SSE answer straight back.
//! - `identify-image`: asks a vision model for product name suggestions
//!   through a forced `suggest_names` tool call.
//!
//! Every response carries permissive CORS headers.

pub mod config;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod routes;
pub mod types;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use gateway::GatewayClient;
pub use routes::{ASK_ASSISTANT_PATH, AppState, IDENTIFY_IMAGE_PATH, router};
