use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use test_utils::chat_stream_fixture;
use test_utils::chunked;
use tokio::sync::Mutex;

use super::ChatService;
use super::ChatSession;
use super::QueryTask;
use crate::domain::models::ByteStream;
use crate::domain::models::ChatBackend;
use crate::domain::models::ChatMessage;
use crate::domain::models::ChatState;
use crate::domain::models::ChatUpdate;
use crate::domain::models::TurnOutcome;

enum Reply {
    Body(Vec<Result<Vec<u8>>>),
    Refused(String),
    Endless,
}

struct FakeBackend {
    replies: StdMutex<Vec<Reply>>,
    requests: StdMutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl FakeBackend {
    fn new(replies: Vec<Reply>) -> Arc<FakeBackend> {
        return Arc::new(FakeBackend {
            replies: StdMutex::new(replies),
            requests: StdMutex::new(vec![]),
        });
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn open_chat(&self, query: &str, history: &[ChatMessage]) -> Result<ByteStream> {
        self.requests
            .lock()
            .unwrap()
            .push((query.to_string(), history.to_vec()));

        let reply = self.replies.lock().unwrap().remove(0);
        match reply {
            Reply::Body(chunks) => return Ok(futures::stream::iter(chunks).boxed()),
            Reply::Refused(msg) => bail!(msg),
            Reply::Endless => return Ok(futures::stream::pending().boxed()),
        }
    }
}

fn fixture_body(chunk_size: usize) -> Reply {
    return Reply::Body(
        chunked(chat_stream_fixture(), chunk_size)
            .into_iter()
            .map(Ok)
            .collect(),
    );
}

#[tokio::test]
async fn it_streams_an_answer_into_the_session() -> Result<()> {
    let backend = FakeBackend::new(vec![fixture_body(5)]);
    let chat = ChatService::new(backend.clone());

    let task = chat.send_query("  What is the invoice total?  ").await?;
    let outcome = task.wait().await?;

    assert_eq!(outcome, TurnOutcome::Completed);

    let session = chat.session();
    let session = session.lock().await;
    assert_eq!(session.state(), ChatState::Idle);
    assert_eq!(
        session.messages(),
        &[
            ChatMessage::user("What is the invoice total?"),
            ChatMessage::assistant("The invoice total is redacted."),
        ]
    );

    let debug = session.debug().unwrap();
    assert_eq!(debug.context_sent_to_llm, "Invoice total: [REDACTED] EUR");
    assert_eq!(debug.vector_matches.len(), 2);

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].0, "What is the invoice total?");
    assert!(requests[0].1.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_sends_prior_transcript_as_history() -> Result<()> {
    let backend = FakeBackend::new(vec![fixture_body(64), fixture_body(64)]);
    let chat = ChatService::new(backend.clone());

    chat.send_query("First?").await?.wait().await?;
    chat.send_query("Second?").await?.wait().await?;

    let requests = backend.requests.lock().unwrap();
    assert_eq!(
        requests[1].1,
        vec![
            ChatMessage::user("First?"),
            ChatMessage::assistant("The invoice total is redacted."),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_rejects_blank_questions() {
    let backend = FakeBackend::new(vec![]);
    let chat = ChatService::new(backend.clone());

    assert!(chat.send_query("   ").await.is_err());
    assert!(chat.session().lock().await.messages().is_empty());
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_fails_the_turn_when_the_call_is_refused() -> Result<()> {
    let backend = FakeBackend::new(vec![Reply::Refused("Not authenticated".to_string())]);
    let chat = ChatService::new(backend);

    let outcome = chat.send_query("Hi").await?.wait().await?;

    assert_eq!(outcome, TurnOutcome::Failed("Not authenticated".to_string()));
    let session = chat.session();
    let session = session.lock().await;
    assert_eq!(session.state(), ChatState::Idle);
    assert_eq!(
        session.messages(),
        &[ChatMessage::user("Hi"), ChatMessage::assistant("")]
    );

    return Ok(());
}

#[tokio::test]
async fn it_keeps_partial_answers_when_the_body_fails() -> Result<()> {
    let backend = FakeBackend::new(vec![Reply::Body(vec![
        Ok(b"{\"type\":\"token\",\"content\":\"Half\"}\n{\"type\":\"tok".to_vec()),
        Err(anyhow!("connection reset")),
    ])]);
    let chat = ChatService::new(backend);

    let outcome = chat.send_query("Hi").await?.wait().await?;

    assert_eq!(outcome, TurnOutcome::Failed("connection reset".to_string()));
    let session = chat.session();
    let mut session = session.lock().await;
    assert_eq!(session.messages()[1], ChatMessage::assistant("Half"));
    assert!(session.begin("Again").is_ok());

    return Ok(());
}

#[tokio::test]
async fn it_rejects_a_query_while_one_is_streaming() -> Result<()> {
    let backend = FakeBackend::new(vec![Reply::Endless]);
    let chat = ChatService::new(backend.clone());

    let task = chat.send_query("First").await?;
    let res = chat.send_query("Second").await;

    assert!(res.is_err());
    assert_eq!(
        chat.session().lock().await.messages(),
        &[ChatMessage::user("First"), ChatMessage::assistant("")]
    );

    assert_eq!(task.cancel().await, TurnOutcome::Cancelled);
    return Ok(());
}

#[tokio::test]
async fn it_cancels_an_in_flight_answer() -> Result<()> {
    let backend = FakeBackend::new(vec![
        Reply::Endless,
        fixture_body(16),
    ]);
    let chat = ChatService::new(backend.clone());
    let mut updates = chat.subscribe().await;

    let task = chat.send_query("Slow?").await?;
    while backend.requests.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(!task.is_finished());
    assert_eq!(task.cancel().await, TurnOutcome::Cancelled);

    {
        let session = chat.session();
        let session = session.lock().await;
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.last_outcome(), Some(&TurnOutcome::Cancelled));
    }

    let mut states = vec![];
    while let Ok(update) = updates.try_recv() {
        if let ChatUpdate::State(state) = update {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![ChatState::Awaiting, ChatState::Settled, ChatState::Idle]
    );

    // A new question is accepted after cancelling.
    let outcome = chat.send_query("Fast?").await?.wait().await?;
    assert_eq!(outcome, TurnOutcome::Completed);

    return Ok(());
}

#[tokio::test]
async fn it_returns_the_real_outcome_when_cancelling_a_finished_turn() -> Result<()> {
    let backend = FakeBackend::new(vec![fixture_body(8)]);
    let chat = ChatService::new(backend);

    let task = chat.send_query("Hi").await?;
    while !task.is_finished() {
        tokio::task::yield_now().await;
    }

    assert_eq!(task.cancel().await, TurnOutcome::Completed);
    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_completed_outcome_when_abort_lands_after_settling() -> Result<()> {
    let session = Arc::new(Mutex::new(ChatSession::default()));
    let turn = session.lock().await.begin("Hi")?;

    // Settles on its own, then stays pending until aborted.
    let turn_session = session.clone();
    let turn_id = turn.id;
    let handle = tokio::spawn(async move {
        turn_session
            .lock()
            .await
            .settle(turn_id, TurnOutcome::Completed);
        return futures::future::pending::<TurnOutcome>().await;
    });

    while session.lock().await.state() != ChatState::Idle {
        tokio::task::yield_now().await;
    }

    let task = QueryTask {
        turn_id,
        session: session.clone(),
        handle,
    };

    assert_eq!(task.cancel().await, TurnOutcome::Completed);
    assert_eq!(
        session.lock().await.last_outcome(),
        Some(&TurnOutcome::Completed)
    );

    return Ok(());
}
