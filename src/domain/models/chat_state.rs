use super::DebugSnapshot;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChatState {
    Idle,
    Awaiting,
    Streaming,
    Settled,
}

impl ChatState {
    /// A turn is in flight and owns the tail of the transcript.
    pub fn is_busy(&self) -> bool {
        return matches!(self, ChatState::Awaiting | ChatState::Streaming);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Notifications sent to session subscribers, in the order the session was
/// mutated.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatUpdate {
    State(ChatState),
    Token(String),
    Debug(Option<DebugSnapshot>),
    ServerError(String),
}
