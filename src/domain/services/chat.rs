#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::ChatSession;
use super::FrameStream;
use super::MessageRouter;
use super::Turn;
use crate::domain::models::ChatBackend;
use crate::domain::models::ChatUpdate;
use crate::domain::models::TurnOutcome;

async fn stream_turn(
    backend: &dyn ChatBackend,
    session: &Mutex<ChatSession>,
    turn: &Turn,
) -> Result<()> {
    let body = backend.open_chat(&turn.query, &turn.history).await?;
    let mut frames = FrameStream::new(body);

    while let Some(line) = frames.next().await? {
        let mut session = session.lock().await;
        MessageRouter::route(&line, &mut session);
    }

    return Ok(());
}

async fn run_turn(
    backend: Arc<dyn ChatBackend>,
    session: Arc<Mutex<ChatSession>>,
    turn: Turn,
) -> TurnOutcome {
    let outcome = match stream_turn(backend.as_ref(), &session, &turn).await {
        Ok(()) => TurnOutcome::Completed,
        Err(err) => TurnOutcome::Failed(format!("{err:#}")),
    };

    session.lock().await.settle(turn.id, outcome.clone());

    return outcome;
}

/// One in-flight answer. Dropping it leaves the answer streaming; use
/// `cancel` to stop it.
pub struct QueryTask {
    turn_id: u64,
    session: Arc<Mutex<ChatSession>>,
    handle: JoinHandle<TurnOutcome>,
}

impl QueryTask {
    pub fn turn_id(&self) -> u64 {
        return self.turn_id;
    }

    pub fn is_finished(&self) -> bool {
        return self.handle.is_finished();
    }

    /// Stops reading the answer. Whatever text already arrived stays in the
    /// transcript.
    pub async fn cancel(self) -> TurnOutcome {
        self.handle.abort();

        // The turn may have finished on its own before the abort landed.
        if let Ok(outcome) = self.handle.await {
            return outcome;
        }

        let mut session = self.session.lock().await;
        if session.settle(self.turn_id, TurnOutcome::Cancelled) {
            return TurnOutcome::Cancelled;
        }

        // Settled by the turn itself just before the abort landed.
        if session.turn_id() == self.turn_id {
            if let Some(outcome) = session.last_outcome() {
                return outcome.clone();
            }
        }

        return TurnOutcome::Cancelled;
    }

    pub async fn wait(self) -> Result<TurnOutcome> {
        let outcome = self
            .handle
            .await
            .map_err(|err| return anyhow!("Chat turn {} stopped unexpectedly: {err}", self.turn_id))?;

        return Ok(outcome);
    }
}

pub struct ChatService {
    backend: Arc<dyn ChatBackend>,
    session: Arc<Mutex<ChatSession>>,
}

impl ChatService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> ChatService {
        return ChatService {
            backend,
            session: Arc::new(Mutex::new(ChatSession::default())),
        };
    }

    pub fn session(&self) -> Arc<Mutex<ChatSession>> {
        return self.session.clone();
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<ChatUpdate> {
        return self.session.lock().await.subscribe();
    }

    /// Submits a question and starts streaming its answer in the background.
    /// Fails without touching the transcript when the question is blank or
    /// another answer is still in flight.
    pub async fn send_query(&self, query: &str) -> Result<QueryTask> {
        let query = query.trim();
        if query.is_empty() {
            bail!("Cannot send an empty question");
        }

        let turn = self.session.lock().await.begin(query)?;
        let turn_id = turn.id;

        let handle = tokio::spawn(run_turn(
            self.backend.clone(),
            self.session.clone(),
            turn,
        ));

        return Ok(QueryTask {
            turn_id,
            session: self.session.clone(),
            handle,
        });
    }
}
