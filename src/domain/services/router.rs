#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

use serde_json::Value;

use super::ChatSession;
use crate::domain::models::StreamEvent;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    Token,
    Debug,
    ServerError,
    Ignored,
    Malformed,
}

pub struct MessageRouter {}

impl MessageRouter {
    /// Applies one decoded line to the session. Never fails: unusable lines
    /// are logged and dropped.
    pub fn route(line: &str, session: &mut ChatSession) -> Routed {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = ?err, line = line, "Skipping malformed stream record");
                return Routed::Malformed;
            }
        };

        let known_kind = value
            .get("type")
            .and_then(|kind| return kind.as_str())
            .is_some_and(|kind| return StreamEvent::KINDS.contains(&kind));
        if !known_kind {
            tracing::debug!(line = line, "Ignoring stream record without a known type");
            return Routed::Ignored;
        }

        let event = match serde_json::from_value::<StreamEvent>(value) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = ?err, line = line, "Skipping stream record with unexpected shape");
                return Routed::Malformed;
            }
        };

        match event {
            StreamEvent::Token { content } => {
                session.append_token(&content);
                return Routed::Token;
            }
            StreamEvent::Debug { data } => {
                session.replace_debug(data);
                return Routed::Debug;
            }
            StreamEvent::Error { content } => {
                tracing::error!(error = content.as_str(), "Server failed to generate an answer");
                session.record_server_error(&content);
                return Routed::ServerError;
            }
        }
    }
}
