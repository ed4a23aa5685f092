//! Accumulated assistant answer state.

/// The answer being assembled for one question.
///
/// `full_text` only grows while the stream is live. `linked_item_ids` stays
/// empty until [`finalize`](Self::finalize) runs once after the stream is
/// drained; that is also the only point where text is removed (the marker).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantAnswer {
    full_text: String,
    linked_item_ids: Vec<String>,
    finalized: bool,
}

impl AssistantAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text delta. Returns `false` (and does nothing) once finalized.
    pub fn push_delta(&mut self, delta: &str) -> bool {
        if self.finalized {
            return false;
        }
        self.full_text.push_str(delta);
        true
    }

    /// Replace the text with its marker-free form and record the referenced ids.
    ///
    /// Only the first call has an effect.
    pub fn finalize(&mut self, display_text: String, linked_item_ids: Vec<String>) {
        if self.finalized {
            return;
        }
        self.full_text = display_text;
        self.linked_item_ids = linked_item_ids;
        self.finalized = true;
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Length of the accumulated text in bytes.
    pub fn len(&self) -> usize {
        self.full_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty()
    }

    pub fn linked_item_ids(&self) -> &[String] {
        &self.linked_item_ids
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
