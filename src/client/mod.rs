pub mod transport;

use chrono::Utc;
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::prompt::PromptConfig;
use crate::models::chat::{Message, Origin};
use crate::models::wire::{Envelope, HistoryEntry, HISTORY_WINDOW};
use self::transport::{RelayTransport, TransportError};

/// What a call to `send` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A genuine assistant reply was appended.
    Answered,
    /// The relay reported a structured error; it was appended verbatim.
    RelayError,
    /// The request itself failed; a connection-trouble message was appended.
    ConnectionError,
    /// Rejected without side effects: blank input.
    RejectedEmpty,
    /// Rejected without side effects: a send is already in flight.
    RejectedBusy,
}

/// A failed turn the user can replay with one click. Carrying the original
/// request as data keeps the retry path out of captured closures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryNotice {
    pub message: String,
    pub original_request: String,
}

/// What the Enter key should do given its modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Submit,
    InsertNewline,
}

/// Plain Enter submits; shift+Enter stays in the input as a newline.
pub fn enter_action(shift_held: bool) -> InputAction {
    if shift_held {
        InputAction::InsertNewline
    } else {
        InputAction::Submit
    }
}

struct ClientState {
    transcript: Vec<Message>,
    input: String,
    sending: bool,
    notice: Option<RetryNotice>,
    revision: u64,
    last_id: i64,
}

impl ClientState {
    fn next_id(&mut self) -> i64 {
        // Creation-time ids, bumped past the previous one when two
        // messages land in the same millisecond.
        let now = Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    fn push(&mut self, origin: Origin, text: String, error: bool) {
        let id = self.next_id();
        self.transcript.push(Message {
            id,
            text,
            origin,
            timestamp: Utc::now().timestamp_millis(),
            error,
        });
        self.revision += 1;
    }

    /// The sliding last-10 suffix of the transcript, reduced to the wire
    /// shape. Taken before the new user turn is appended.
    fn window(&self) -> Vec<HistoryEntry> {
        let tail = self.transcript.len().saturating_sub(HISTORY_WINDOW);
        self.transcript[tail..]
            .iter()
            .map(|message| HistoryEntry {
                text: message.text.clone(),
                is_bot: message.origin == Origin::Assistant,
            })
            .collect()
    }
}

/// Turn-taking conversation state machine behind the chat widget: an
/// append-only transcript, a single-request-in-flight guard, and a retry
/// notice for recoverable failures. Errors resolve back to idle; the
/// conversation is never interrupted or cleared by one.
pub struct ConversationClient {
    relay: Arc<dyn RelayTransport>,
    greeting: String,
    state: Mutex<ClientState>,
}

impl ConversationClient {
    pub fn new(relay: Arc<dyn RelayTransport>, prompts: &PromptConfig) -> Self {
        let mut state = ClientState {
            transcript: Vec::new(),
            input: String::new(),
            sending: false,
            notice: None,
            revision: 0,
            last_id: 0,
        };
        state.push(Origin::Assistant, prompts.greeting.clone(), false);

        Self {
            relay,
            greeting: prompts.greeting.clone(),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Transcript snapshot in append order.
    pub fn transcript(&self) -> Vec<Message> {
        self.lock().transcript.clone()
    }

    /// True exactly while a request is in flight. Drives the typing
    /// indicator, which is never part of the transcript.
    pub fn typing(&self) -> bool {
        self.lock().sending
    }

    /// Bumps on every transcript or typing change; renderers auto-scroll
    /// to the newest content when this moves.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn notice(&self) -> Option<RetryNotice> {
        self.lock().notice.clone()
    }

    pub fn dismiss_notice(&self) {
        self.lock().notice = None;
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    /// Applies the Enter key: plain Enter submits the buffer, shift+Enter
    /// appends a literal newline instead.
    pub async fn press_enter(&self, shift_held: bool) -> Option<SendOutcome> {
        match enter_action(shift_held) {
            InputAction::InsertNewline => {
                self.lock().input.push('\n');
                None
            }
            InputAction::Submit => Some(self.submit().await),
        }
    }

    /// Sends whatever is in the input buffer.
    pub async fn submit(&self) -> SendOutcome {
        let text = self.input();
        self.send(&text).await
    }

    /// Sends a fresh user turn.
    pub async fn send(&self, text: &str) -> SendOutcome {
        self.send_inner(text, false).await
    }

    /// Replays the request carried by the current retry notice. The notice
    /// is consumed; a rejected replay puts it back.
    pub async fn retry(&self) -> Option<SendOutcome> {
        let notice = self.lock().notice.take()?;
        let outcome = self.send_inner(&notice.original_request, true).await;
        if outcome == SendOutcome::RejectedBusy {
            self.lock().notice.get_or_insert(notice);
        }
        Some(outcome)
    }

    async fn send_inner(&self, text: &str, is_retry: bool) -> SendOutcome {
        let message = text.trim().to_string();
        if message.is_empty() {
            return SendOutcome::RejectedEmpty;
        }

        // Capture the history window before the new user turn is appended,
        // flip the sending guard, and release the lock for the call.
        let history = {
            let mut state = self.lock();
            if state.sending {
                return SendOutcome::RejectedBusy;
            }
            let history = state.window();
            if !is_retry {
                state.push(Origin::User, message.clone(), false);
                state.input.clear();
            }
            state.sending = true;
            state.revision += 1;
            history
        };

        let result = self.relay.relay(&message, &history).await;

        let mut state = self.lock();
        let outcome = match result {
            Ok(Envelope::Success { response }) => {
                state.push(Origin::Assistant, response, false);
                SendOutcome::Answered
            }
            Ok(Envelope::Failure { error }) => {
                warn!("Relay reported an error: {}", error);
                let retryable = is_retryable_error(&error);
                state.push(Origin::Assistant, error.clone(), true);
                if retryable {
                    state.notice = Some(RetryNotice {
                        message: error,
                        original_request: message,
                    });
                }
                SendOutcome::RelayError
            }
            Err(transport) => {
                warn!("Relay request failed: {}", transport);
                state.push(Origin::Assistant, connection_trouble_text(&transport), true);
                state.notice = Some(RetryNotice {
                    message: "The last message didn't go through.".to_string(),
                    original_request: message,
                });
                SendOutcome::ConnectionError
            }
        };
        state.sending = false;
        state.revision += 1;
        outcome
    }

    /// Replaces the whole transcript with a single fresh greeting. An
    /// in-flight request is not cancelled; its reply will land on the
    /// reset transcript.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.transcript.clear();
        let greeting = self.greeting.clone();
        state.push(Origin::Assistant, greeting, false);
    }
}

/// Relay errors worth offering a one-click retry for.
fn is_retryable_error(error_text: &str) -> bool {
    let lowered = error_text.to_lowercase();
    lowered.contains("quota") || lowered.contains("high demand")
}

fn connection_trouble_text(error: &TransportError) -> String {
    format!(
        "Sorry, I'm having trouble connecting right now. Please try again. ({})",
        error
    )
}
