//! One question/answer cycle against the assistant.
//!
//! [`AssistantSession::ask`] drives the cycle
//! `Idle -> Sending -> Streaming -> Finalizing -> Idle` (or `-> Failed -> Idle`)
//! and publishes what the panel should show through a
//! [`tokio::sync::watch`] channel. At most one cycle runs at a time; an
//! `ask` while one is outstanding returns [`AskOutcome::Skipped`] without
//! touching the network.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use homevault_types::{AskRequest, AssistantAnswer, AssistantError, InventoryItem};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::AssistantClient;
use crate::marker::extract_marker;
use crate::projector::project_items;
use crate::streaming::DecodedFrame;

/// Shown when the request or the body read fails below HTTP.
pub const DEFAULT_CONNECTION_ERROR: &str = "שגיאה בחיבור לעוזר";

/// Shown when the proxy answers with an error status and no message.
pub const DEFAULT_RESPONSE_ERROR: &str = "שגיאה בקבלת תשובה";

/// Phase of the current ask cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Ready for a question.
    #[default]
    Idle,
    /// Request issued, waiting for response headers.
    Sending,
    /// Reading the response body.
    Streaming,
    /// Extracting the marker and resolving items.
    Finalizing,
    /// The cycle ended with an error; the message is displayed.
    Failed,
}

/// What the assistant panel currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerView {
    pub state: SessionState,
    /// Partial text while streaming; marker-free text once finalized; the
    /// failure message after an error.
    pub text: String,
    /// Items referenced by the answer marker.
    pub items: Vec<InventoryItem>,
}

/// Localized strings displayed on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessages {
    /// Transport failure (no response, body read failure).
    pub connection_error: String,
    /// HTTP failure without a server-provided message.
    pub response_error: String,
}

impl Default for AssistantMessages {
    fn default() -> Self {
        Self {
            connection_error: DEFAULT_CONNECTION_ERROR.into(),
            response_error: DEFAULT_RESPONSE_ERROR.into(),
        }
    }
}

impl AssistantMessages {
    /// Text to display for `err`.
    pub fn for_error(&self, err: &AssistantError) -> String {
        match err {
            AssistantError::Http { .. } | AssistantError::AnswerTooLarge { .. } => err
                .server_message()
                .unwrap_or(&self.response_error)
                .to_string(),
            AssistantError::Network(_) | AssistantError::Stream(_) => {
                self.connection_error.clone()
            }
            AssistantError::Cancelled => String::new(),
        }
    }
}

/// Why an `ask` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The question was empty after trimming.
    EmptyQuestion,
    /// Another question is still in flight.
    Busy,
}

/// A completed answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    /// Display text with the marker removed.
    pub text: String,
    /// Ids named by the marker, in marker order.
    pub item_ids: Vec<String>,
    /// Caller items whose id appears in `item_ids`, in collection order.
    pub items: Vec<InventoryItem>,
}

/// Result of one [`AssistantSession::ask`] call.
#[derive(Debug)]
pub enum AskOutcome {
    /// Nothing was sent.
    Skipped(SkipReason),
    /// The stream completed and was finalized.
    Answered(AssistantReply),
    /// The cycle failed; `message` is what the panel shows.
    Failed {
        message: String,
        error: AssistantError,
    },
    /// The session was closed before the cycle finished.
    Cancelled,
}

#[derive(Debug, Default)]
struct Guard {
    state: SessionState,
    /// Bumped on every new cycle and on close; stale cycles stop publishing.
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Assistant panel controller.
///
/// # Example
///
/// ```no_run
/// use homevault_assistant::{AssistantClient, AssistantSession, AskOutcome};
/// # async fn run(items: Vec<homevault_types::InventoryItem>) {
/// let session = AssistantSession::new(AssistantClient::new("https://project.example.co", "key"));
/// let mut view = session.subscribe();
/// if let AskOutcome::Answered(reply) = session.ask("מתי פג האחריות של המקרר?", &items).await {
///     println!("{} ({} items)", reply.text, reply.items.len());
/// }
/// # }
/// ```
pub struct AssistantSession {
    client: AssistantClient,
    messages: AssistantMessages,
    max_answer_len: Option<usize>,
    guard: Mutex<Guard>,
    view: watch::Sender<AnswerView>,
}

impl AssistantSession {
    pub fn new(client: AssistantClient) -> Self {
        Self {
            client,
            messages: AssistantMessages::default(),
            max_answer_len: None,
            guard: Mutex::new(Guard::default()),
            view: watch::Sender::new(AnswerView::default()),
        }
    }

    /// Override the failure strings.
    #[must_use]
    pub fn messages(mut self, messages: AssistantMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Fail the cycle with [`AssistantError::AnswerTooLarge`] once the
    /// accumulated answer exceeds `limit` bytes. Unbounded by default.
    #[must_use]
    pub fn max_answer_len(mut self, limit: usize) -> Self {
        self.max_answer_len = Some(limit);
        self
    }

    /// Watch what the panel shows.
    pub fn subscribe(&self) -> watch::Receiver<AnswerView> {
        self.view.subscribe()
    }

    /// Current phase.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Close the panel: clear the visible answer and abort any in-flight cycle.
    pub fn close(&self) {
        let mut guard = self.lock();
        guard.generation += 1;
        if let Some(token) = guard.cancel.take() {
            token.cancel();
        }
        guard.state = SessionState::Idle;
        self.view.send_replace(AnswerView::default());
        tracing::debug!(generation = guard.generation, "assistant session closed");
    }

    /// Ask `question` about `items`.
    ///
    /// `items` should already be ordered newest first; the same slice is used
    /// both for the prompt and to resolve referenced ids.
    pub async fn ask(&self, question: &str, items: &[InventoryItem]) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::Skipped(SkipReason::EmptyQuestion);
        }
        let Some(cycle) = self.begin() else {
            tracing::debug!("ask ignored, a question is already in flight");
            return AskOutcome::Skipped(SkipReason::Busy);
        };
        let generation = cycle.generation;

        let result = tokio::select! {
            biased;
            _ = cycle.cancel.cancelled() => Err(AssistantError::Cancelled),
            result = self.run_cycle(generation, question, items) => result,
        };

        let outcome = match result {
            Ok(reply) => AskOutcome::Answered(reply),
            Err(AssistantError::Cancelled) => AskOutcome::Cancelled,
            Err(error) => {
                let message = self.messages.for_error(&error);
                tracing::warn!(error = %error, "ask failed");
                self.update(generation, |view| {
                    view.state = SessionState::Failed;
                    view.text = message.clone();
                    view.items.clear();
                });
                AskOutcome::Failed { message, error }
            }
        };
        drop(cycle);
        outcome
    }

    async fn run_cycle(
        &self,
        generation: u64,
        question: &str,
        items: &[InventoryItem],
    ) -> Result<AssistantReply, AssistantError> {
        let request = AskRequest {
            question: question.to_string(),
            items: project_items(items),
        };
        let mut stream = self.client.ask_stream(&request).await?;
        self.update(generation, |view| view.state = SessionState::Streaming);

        let mut answer = AssistantAnswer::new();
        while let Some(frame) = stream.next().await {
            match frame? {
                DecodedFrame::Delta(text) => {
                    answer.push_delta(&text);
                    if let Some(limit) = self.max_answer_len
                        && answer.len() > limit
                    {
                        return Err(AssistantError::AnswerTooLarge { limit });
                    }
                    self.update(generation, |view| view.text = answer.full_text().to_string());
                }
                DecodedFrame::Done => break,
            }
        }

        self.update(generation, |view| view.state = SessionState::Finalizing);
        let extraction = extract_marker(answer.full_text());
        answer.finalize(extraction.text, extraction.item_ids);

        let linked = answer.linked_item_ids();
        let resolved: Vec<InventoryItem> = items
            .iter()
            .filter(|item| linked.contains(&item.id))
            .cloned()
            .collect();
        if resolved.len() < linked.len() {
            tracing::debug!(
                referenced = linked.len(),
                resolved = resolved.len(),
                "dropping unknown item ids from answer"
            );
        }

        let reply = AssistantReply {
            text: answer.full_text().to_string(),
            item_ids: linked.to_vec(),
            items: resolved,
        };
        self.update(generation, |view| {
            view.text = reply.text.clone();
            view.items = reply.items.clone();
        });
        Ok(reply)
    }

    fn lock(&self) -> MutexGuard<'_, Guard> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the session for a new cycle and reset the visible answer.
    ///
    /// The session is released when the returned guard drops, including when
    /// the `ask` future is dropped mid-cycle.
    fn begin(&self) -> Option<CycleGuard<'_>> {
        let mut guard = self.lock();
        if guard.state != SessionState::Idle {
            return None;
        }
        guard.generation += 1;
        guard.state = SessionState::Sending;
        let token = CancellationToken::new();
        guard.cancel = Some(token.clone());
        self.view.send_replace(AnswerView {
            state: SessionState::Sending,
            ..AnswerView::default()
        });
        tracing::debug!(generation = guard.generation, "ask cycle started");
        Some(CycleGuard {
            session: self,
            generation: guard.generation,
            cancel: token,
        })
    }

    /// Release the session if `generation` still owns it.
    fn end(&self, generation: u64) {
        let mut guard = self.lock();
        if guard.generation != generation {
            return;
        }
        guard.state = SessionState::Idle;
        guard.cancel = None;
        self.view.send_modify(|view| view.state = SessionState::Idle);
        tracing::debug!(generation, "ask cycle finished");
    }

    /// Apply `f` to the visible answer if `generation` is still current.
    fn update(&self, generation: u64, f: impl FnOnce(&mut AnswerView)) {
        let mut guard = self.lock();
        if guard.generation != generation {
            return;
        }
        let mut view = self.view.borrow().clone();
        f(&mut view);
        guard.state = view.state;
        self.view.send_replace(view);
    }
}

/// Ownership of one ask cycle.
struct CycleGuard<'a> {
    session: &'a AssistantSession,
    generation: u64,
    cancel: CancellationToken,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.session.end(self.generation);
    }
}
