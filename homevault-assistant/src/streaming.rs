//! Chat-stream decoding for the ask-assistant proxy.
//!
//! The proxy relays an OpenAI-compatible Server-Sent Events body:
//!
//! ```text
//! : keepalive
//! data: {"choices":[{"delta":{"content":"המקרר"}}]}
//!
//! data: {"choices":[{"delta":{"content":" במטבח"}}]}
//!
//! data: [DONE]
//! ```
//!
//! [`ChatStreamDecoder`] is the synchronous core: it takes arbitrary byte
//! chunks and returns the frames completed by each one. [`decode_stream`]
//! drives it over an async byte stream, one read at a time.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use homevault_types::AssistantError;

/// Prefix of every payload-carrying line.
const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream.
const DONE_SENTINEL: &str = "[DONE]";

/// One unit of decoder output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// A non-empty text fragment from `choices[0].delta.content`.
    Delta(String),
    /// The `[DONE]` terminator. Nothing is decoded after it.
    Done,
}

/// Incremental decoder for a `data: <json>` line stream.
///
/// Bytes are decoded as UTF-8 across chunk boundaries and appended to a
/// rolling line buffer; every complete line is interpreted as it appears.
/// A payload that fails to parse is held back as a pending frame when it is
/// structurally incomplete (unclosed braces, brackets or string) and
/// completed by the following line(s); a balanced payload that still fails
/// to parse is skipped.
#[derive(Debug, Default)]
pub struct ChatStreamDecoder {
    /// Trailing bytes of a UTF-8 sequence split across chunks.
    utf8_tail: Vec<u8>,
    /// Decoded text not yet terminated by `\n`.
    line_buf: String,
    /// Incomplete JSON payload awaiting continuation lines.
    pending_frame: Option<String>,
    done: bool,
    skipped_frames: usize,
}

enum LineOutcome {
    Ignored,
    Delta(String),
    Done,
}

impl ChatStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` terminator has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of complete-but-invalid payloads skipped so far.
    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    /// Bytes of decoded text still waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.line_buf.len() + self.pending_frame.as_ref().map_or(0, String::len)
    }

    /// Feed one chunk and return every frame it completes, in order.
    ///
    /// Once [`DecodedFrame::Done`] has been returned, further input is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame> {
        if self.done {
            return Vec::new();
        }
        self.decode_utf8(chunk);

        let mut frames = Vec::new();
        while let Some(newline_pos) = self.line_buf.find('\n') {
            let line = self.line_buf[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            self.line_buf.drain(..=newline_pos);

            match self.process_line(&line) {
                LineOutcome::Ignored => {}
                LineOutcome::Delta(text) => frames.push(DecodedFrame::Delta(text)),
                LineOutcome::Done => {
                    self.done = true;
                    self.line_buf.clear();
                    self.pending_frame = None;
                    frames.push(DecodedFrame::Done);
                    break;
                }
            }
        }
        frames
    }

    /// Signal end of input. Unterminated trailing text is discarded.
    pub fn finish(&mut self) {
        if self.done {
            return;
        }
        if !self.line_buf.trim().is_empty() || self.pending_frame.is_some() {
            tracing::debug!(
                buffered = self.buffered_len(),
                "stream ended with an unterminated frame"
            );
        }
        self.line_buf.clear();
        self.pending_frame = None;
        self.utf8_tail.clear();
    }

    /// Append `chunk` to the line buffer, holding back a split trailing
    /// sequence and replacing invalid bytes with U+FFFD.
    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.utf8_tail.extend_from_slice(chunk);
        let mut consumed = 0;
        loop {
            let rest = &self.utf8_tail[consumed..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.line_buf.push_str(text);
                    consumed = self.utf8_tail.len();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.line_buf
                        .push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            self.line_buf.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid + invalid;
                        }
                        None => {
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }
        self.utf8_tail.drain(..consumed);
    }

    fn process_line(&mut self, line: &str) -> LineOutcome {
        // Blank and comment lines never join or supersede a pending frame.
        if line.trim().is_empty() || line.starts_with(':') {
            return LineOutcome::Ignored;
        }

        if let Some(mut pending) = self.pending_frame.take() {
            if !line.starts_with(DATA_PREFIX) {
                pending.push('\n');
                pending.push_str(line);
                return self.interpret_payload(pending.trim().to_string());
            }
            tracing::warn!(
                len = pending.len(),
                "dropping incomplete frame superseded by a new data line"
            );
            self.skipped_frames += 1;
        }

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return LineOutcome::Ignored;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return LineOutcome::Done;
        }
        self.interpret_payload(payload.to_string())
    }

    fn interpret_payload(&mut self, payload: String) -> LineOutcome {
        let json: serde_json::Value = match serde_json::from_str(&payload) {
            Ok(v) => v,
            Err(e) => {
                if is_incomplete_json(&payload) {
                    self.pending_frame = Some(payload);
                } else {
                    tracing::warn!(error = %e, "skipping malformed stream frame");
                    self.skipped_frames += 1;
                }
                return LineOutcome::Ignored;
            }
        };

        match json["choices"][0]["delta"]["content"].as_str() {
            Some(content) if !content.is_empty() => LineOutcome::Delta(content.to_string()),
            _ => LineOutcome::Ignored,
        }
    }
}

/// Whether `payload` looks like the prefix of a JSON document: it opens more
/// objects/arrays than it closes, or ends inside a string.
fn is_incomplete_json(payload: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for ch in payload.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    in_string || depth > 0
}

/// Frames decoded from a response body.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<DecodedFrame, AssistantError>> + Send>>;

/// Decode a raw byte stream into [`DecodedFrame`]s.
///
/// Reads one chunk at a time. The stream ends after [`DecodedFrame::Done`],
/// when the body is exhausted, or after yielding a read error.
pub fn decode_stream<S, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<DecodedFrame, AssistantError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::stream! {
        let mut decoder = ChatStreamDecoder::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(AssistantError::Network(Box::new(e)));
                    return;
                }
            };

            for frame in decoder.feed(&chunk) {
                yield Ok(frame);
            }
            if decoder.is_done() {
                return;
            }
        }

        decoder.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        let json = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
        format!("data: {json}\n\n")
    }

    fn deltas(frames: &[DecodedFrame]) -> Vec<&str> {
        frames
            .iter()
            .filter_map(|f| match f {
                DecodedFrame::Delta(t) => Some(t.as_str()),
                DecodedFrame::Done => None,
            })
            .collect()
    }

    #[test]
    fn decodes_deltas_and_done() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!("{}{}data: [DONE]\n", frame("Hello "), frame("world"));
        let frames = decoder.feed(body.as_bytes());
        assert_eq!(deltas(&frames), ["Hello ", "world"]);
        assert_eq!(frames.last(), Some(&DecodedFrame::Done));
        assert!(decoder.is_done());
    }

    #[test]
    fn multiple_lines_in_one_read_are_all_extracted() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!("{}{}{}", frame("a"), frame("b"), frame("c"));
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["a", "b", "c"]);
    }

    #[test]
    fn line_split_across_reads_is_reassembled() {
        let mut decoder = ChatStreamDecoder::new();
        let body = frame("split");
        let (head, tail) = body.split_at(17);
        assert!(decoder.feed(head.as_bytes()).is_empty());
        assert_eq!(deltas(&decoder.feed(tail.as_bytes())), ["split"]);
    }

    #[test]
    fn carriage_returns_are_stripped() {
        let mut decoder = ChatStreamDecoder::new();
        let body = frame("crlf").replace('\n', "\r\n");
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["crlf"]);
    }

    #[test]
    fn comments_blank_and_foreign_lines_are_ignored() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!(
            ": keepalive\n\n   \nevent: message\nid: 7\n{}:{}\n",
            frame("kept"),
            frame("not a frame")
        );
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["kept"]);
    }

    #[test]
    fn done_halts_even_with_frames_after_it_in_same_chunk() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!("{}data: [DONE]\n{}", frame("before"), frame("after"));
        let frames = decoder.feed(body.as_bytes());
        assert_eq!(deltas(&frames), ["before"]);
        assert!(decoder.feed(frame("later").as_bytes()).is_empty());
    }

    #[test]
    fn empty_and_missing_content_contribute_nothing() {
        let mut decoder = ChatStreamDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\
                    data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\
                    data: {\"choices\":[]}\n";
        assert!(decoder.feed(body.as_bytes()).is_empty());
        assert_eq!(decoder.skipped_frames(), 0);
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let mut decoder = ChatStreamDecoder::new();
        let body = frame("מקרר");
        let bytes = body.as_bytes();
        let split = body.find('מ').unwrap() + 1;
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(deltas(&decoder.feed(&bytes[split..])), ["מקרר"]);
    }

    #[test]
    fn invalid_utf8_becomes_replacement_character() {
        let mut decoder = ChatStreamDecoder::new();
        let mut bytes = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b"b\"}}]}\n");
        assert_eq!(deltas(&decoder.feed(&bytes)), ["a\u{FFFD}b"]);
    }

    #[test]
    fn incomplete_payload_is_completed_by_continuation_line() {
        let mut decoder = ChatStreamDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":\n{\"content\":\"joined\"}}]}\n";
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["joined"]);
        assert_eq!(decoder.skipped_frames(), 0);
    }

    #[test]
    fn incomplete_payload_survives_interleaved_keepalive() {
        let mut decoder = ChatStreamDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":\n: keepalive\n{\"content\":\"x\"}}]}\n";
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["x"]);
        assert_eq!(decoder.skipped_frames(), 0);
    }

    #[test]
    fn incomplete_payload_survives_blank_separator() {
        let mut decoder = ChatStreamDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":\r\n\r\n{\"content\":\"y\"}}]}\n";
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["y"]);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn incomplete_payload_superseded_by_new_frame_is_dropped() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!("data: {{\"choices\":[\n{}", frame("next"));
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["next"]);
        assert_eq!(decoder.skipped_frames(), 1);
    }

    #[test]
    fn balanced_garbage_is_skipped_without_stalling() {
        let mut decoder = ChatStreamDecoder::new();
        let body = format!("data: {{not json}}\ndata: \n{}", frame("after"));
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), ["after"]);
        assert_eq!(decoder.skipped_frames(), 2);
    }

    #[test]
    fn finish_discards_unterminated_tail() {
        let mut decoder = ChatStreamDecoder::new();
        let body = frame("x");
        let unterminated = body.trim_end();
        assert!(decoder.feed(unterminated.as_bytes()).is_empty());
        decoder.finish();
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn incomplete_json_detection() {
        assert!(is_incomplete_json("{\"a\":[1,2"));
        assert!(is_incomplete_json("{\"a\":\"open string"));
        assert!(is_incomplete_json("{\"a\":\"brace } in string\""));
        assert!(!is_incomplete_json("{\"a\":1}"));
        assert!(!is_incomplete_json("{not json}"));
        assert!(!is_incomplete_json("}{"));
        assert!(!is_incomplete_json(""));
    }

    #[tokio::test]
    async fn decode_stream_yields_frames_across_chunks() {
        let body = format!("{}{}data: [DONE]\n{}", frame("one"), frame("two"), frame("three"));
        let chunks: Vec<Result<Bytes, std::io::Error>> = body
            .as_bytes()
            .chunks(5)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let frames: Vec<DecodedFrame> = decode_stream(futures::stream::iter(chunks))
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(deltas(&frames), ["one", "two"]);
        assert_eq!(frames.last(), Some(&DecodedFrame::Done));
    }

    #[tokio::test]
    async fn decode_stream_surfaces_read_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(frame("partial"))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from(frame("unreached"))),
        ];
        let results: Vec<_> = decode_stream(futures::stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], Ok(DecodedFrame::Delta(t)) if t == "partial"));
        assert!(matches!(&results[1], Err(AssistantError::Network(_))));
    }
}
