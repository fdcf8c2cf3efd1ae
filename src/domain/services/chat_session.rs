#[cfg(test)]
#[path = "chat_session_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::ChatMessage;
use crate::domain::models::ChatState;
use crate::domain::models::ChatUpdate;
use crate::domain::models::DebugSnapshot;
use crate::domain::models::Role;
use crate::domain::models::TurnOutcome;

/// What a submission hands to the streaming call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub id: u64,
    pub query: String,
    pub history: Vec<ChatMessage>,
}

/// The transcript, the current debug snapshot, and where the active turn is
/// in its lifecycle.
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    debug: Option<DebugSnapshot>,
    state: ChatState,
    turn_id: u64,
    server_error: Option<String>,
    last_outcome: Option<TurnOutcome>,
    subscriber: Option<mpsc::UnboundedSender<ChatUpdate>>,
}

impl Default for ChatSession {
    fn default() -> ChatSession {
        return ChatSession {
            messages: vec![],
            debug: None,
            state: ChatState::Idle,
            turn_id: 0,
            server_error: None,
            last_outcome: None,
            subscriber: None,
        };
    }
}

impl ChatSession {
    /// Replaces any previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChatUpdate> {
        let (tx, rx) = mpsc::unbounded_channel::<ChatUpdate>();
        self.subscriber = Some(tx);
        return rx;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        return &self.messages;
    }

    pub fn debug(&self) -> Option<&DebugSnapshot> {
        return self.debug.as_ref();
    }

    pub fn state(&self) -> ChatState {
        return self.state;
    }

    pub fn turn_id(&self) -> u64 {
        return self.turn_id;
    }

    pub fn server_error(&self) -> Option<&str> {
        return self.server_error.as_deref();
    }

    pub fn last_outcome(&self) -> Option<&TurnOutcome> {
        return self.last_outcome.as_ref();
    }

    /// Starts a turn: records the question, clears the previous debug
    /// snapshot and appends the empty assistant message tokens will fill.
    pub fn begin(&mut self, query: &str) -> Result<Turn> {
        if self.state.is_busy() {
            bail!("A question is still being answered. Wait for it to finish or cancel it first.");
        }

        let history = self.messages.clone();
        self.turn_id += 1;
        self.server_error = None;

        self.append_message(ChatMessage::user(query));
        self.set_debug(None);
        self.append_message(ChatMessage::assistant(""));
        self.set_state(ChatState::Awaiting);

        tracing::debug!(turn = self.turn_id, history = history.len(), "Turn started");

        return Ok(Turn {
            id: self.turn_id,
            query: query.to_string(),
            history,
        });
    }

    pub fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Extends the trailing assistant message, creating one if the transcript
    /// ends with anything else.
    pub fn append_token(&mut self, text: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.append(text),
            _ => self.messages.push(ChatMessage::assistant(text)),
        }

        if self.state == ChatState::Awaiting {
            self.set_state(ChatState::Streaming);
        }

        self.notify(ChatUpdate::Token(text.to_string()));
    }

    pub fn replace_debug(&mut self, snapshot: DebugSnapshot) {
        self.set_debug(Some(snapshot));
    }

    pub fn record_server_error(&mut self, message: &str) {
        self.server_error = Some(message.to_string());
        self.notify(ChatUpdate::ServerError(message.to_string()));
    }

    /// Closes turn `turn_id` and returns to idle. Returns false when that turn
    /// is not the one in flight, e.g. it was already settled by a cancel.
    pub fn settle(&mut self, turn_id: u64, outcome: TurnOutcome) -> bool {
        if turn_id != self.turn_id || !self.state.is_busy() {
            return false;
        }

        match &outcome {
            TurnOutcome::Completed => tracing::debug!(turn = turn_id, "Turn completed"),
            TurnOutcome::Cancelled => tracing::info!(turn = turn_id, "Turn cancelled"),
            TurnOutcome::Failed(err) => {
                tracing::error!(turn = turn_id, error = err.as_str(), "Turn failed")
            }
        }

        self.last_outcome = Some(outcome);
        self.set_state(ChatState::Settled);
        self.set_state(ChatState::Idle);

        return true;
    }

    fn set_state(&mut self, state: ChatState) {
        self.state = state;
        self.notify(ChatUpdate::State(state));
    }

    fn set_debug(&mut self, snapshot: Option<DebugSnapshot>) {
        self.debug = snapshot.clone();
        self.notify(ChatUpdate::Debug(snapshot));
    }

    fn notify(&mut self, update: ChatUpdate) {
        let closed = match &self.subscriber {
            Some(tx) => tx.send(update).is_err(),
            None => false,
        };

        if closed {
            self.subscriber = None;
        }
    }
}
