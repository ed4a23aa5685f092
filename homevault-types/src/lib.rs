//! Shared domain types for homevault.
//!
//! Every other homevault crate depends on this one. It holds the inventory
//! records as they come back from the hosted backend, the compact
//! [`ItemSnapshot`] projection sent to the assistant, the accumulated
//! [`AssistantAnswer`], and the error enums shared across crates.

pub mod answer;
pub mod error;
pub mod item;
pub mod snapshot;

pub use answer::*;
pub use error::*;
pub use item::*;
pub use snapshot::*;
