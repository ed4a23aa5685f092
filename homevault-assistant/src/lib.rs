//! Streaming AI assistant client for homevault.
//!
//! Answers natural-language questions about the user's inventory by posting
//! the question and a snapshot of every item to the `ask-assistant` function
//! and decoding its Server-Sent Events reply.
//!
//! # Usage
//!
//! ```no_run
//! use homevault_assistant::{AssistantClient, AssistantSession};
//!
//! let session = AssistantSession::new(
//!     AssistantClient::new("https://project.example.co", "publishable-key"),
//! )
//! .max_answer_len(64 * 1024);
//! ```
//!
//! # Pieces
//!
//! - [`project_items`]: inventory records to prompt snapshots
//! - [`ChatStreamDecoder`] / [`decode_stream`]: `data: <json>` lines to text deltas
//! - [`extract_marker`]: `[ITEMS:id1,id2]` marker to display text and ids
//! - [`AssistantSession`]: the single-flight ask cycle

pub mod client;
pub(crate) mod error;
pub mod marker;
pub mod projector;
pub mod session;
pub mod streaming;

pub use client::{AnswerStream, AssistantClient};
pub use marker::{MarkerExtraction, extract_marker};
pub use projector::{project_item, project_items};
pub use session::{
    AnswerView, AskOutcome, AssistantMessages, AssistantReply, AssistantSession, SessionState,
    SkipReason,
};
pub use streaming::{ChatStreamDecoder, DecodedFrame, decode_stream};

// Re-export homevault-types for convenience
pub use homevault_types::{AskRequest, AssistantError, InventoryItem, ItemSnapshot};
