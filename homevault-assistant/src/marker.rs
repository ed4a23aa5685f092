//! Extraction of the `[ITEMS:id1,id2]` reference marker from an answer.
//!
//! The proxy instructs the model to append this marker when several items
//! could satisfy the question. Only the first well-formed marker is honored.

/// Opening of a marker; the id list runs to the first following `]`.
const MARKER_OPEN: &str = "[ITEMS:";

/// Result of splitting an answer into display text and referenced ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerExtraction {
    /// The answer with the marker removed and surrounding whitespace trimmed,
    /// or the input unchanged when no marker was found.
    pub text: String,
    /// Referenced item ids in marker order, each trimmed.
    pub item_ids: Vec<String>,
}

/// Locate the first marker: byte range of the whole marker and of its id list.
///
/// A marker needs at least one character between `[ITEMS:` and `]`; an empty
/// `[ITEMS:]` is skipped in favor of a later occurrence.
fn find_marker(text: &str) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(MARKER_OPEN) {
        let start = search_from + offset;
        let ids_start = start + MARKER_OPEN.len();
        let close = text[ids_start..].find(']')?;
        if close > 0 {
            let ids_end = ids_start + close;
            return Some((start..ids_end + 1, ids_start..ids_end));
        }
        search_from = ids_start;
    }
    None
}

/// Split `text` into display text and the ids named by its first marker.
pub fn extract_marker(text: &str) -> MarkerExtraction {
    let Some((marker, ids)) = find_marker(text) else {
        return MarkerExtraction {
            text: text.to_string(),
            item_ids: Vec::new(),
        };
    };

    let item_ids = text[ids]
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();

    let mut stripped = String::with_capacity(text.len() - marker.len());
    stripped.push_str(&text[..marker.start]);
    stripped.push_str(&text[marker.end..]);

    MarkerExtraction {
        text: stripped.trim().to_string(),
        item_ids,
    }
}
