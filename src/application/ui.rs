#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AudioInput;
use crate::domain::models::ChatState;
use crate::domain::models::ChatUpdate;
use crate::domain::models::CredentialProvider;
use crate::domain::models::DebugSnapshot;
use crate::domain::models::Document;
use crate::domain::models::PendingQuery;
use crate::domain::models::SlashCommand;
use crate::domain::models::TurnOutcome;
use crate::domain::services::ChatService;
use crate::domain::services::ChatSession;
use crate::domain::services::DocumentRegistry;
use crate::domain::services::Microphone;
use crate::domain::services::QueryTask;
use crate::domain::services::RecordingController;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::audio;
use crate::infrastructure::audio::FileAudioInput;
use crate::infrastructure::credentials::FileCredentials;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /voice (/v) - Start recording from the microphone. Run /voice again to stop and transcribe into the pending question.
- /voice <file> - Record from an audio file instead of the microphone.
- /upload <file> (/u) - Upload a document, then reload the document list.
- /docs (/documents) - Show the document list.
- /delete <id> (/rm) - Delete a document.
- /debug (/d) - Toggle the retrieval debug panel shown after each answer.
- /cancel - Stop the answer that is streaming.
- /help (/h) - Show this help.
- /quit (/q) - Exit.

Type a question and press Enter to ask it. An empty line sends the pending question from /voice.
"#;

    return text.trim().to_string();
}

pub fn format_document(document: &Document) -> String {
    let risk = match (document.risk_level(), document.risk_score) {
        (Some(level), Some(score)) => format!("{level} ({score})"),
        _ => "unscored".to_string(),
    };

    return format!(
        "- (ID: {}) {}, Status: {}, Risk: {}, Uploaded: {}",
        document.id, document.filename, document.status, risk, document.created_at
    );
}

pub fn format_debug(snapshot: &DebugSnapshot) -> String {
    let mut lines = vec!["Vector matches:".to_string()];
    if snapshot.vector_matches.is_empty() {
        lines.push("  (none)".to_string());
    }
    for vector_match in snapshot.vector_matches.iter() {
        lines.push(format!(
            "  {:.4}  {}",
            vector_match.score, vector_match.filename
        ));
    }

    lines.push("Context sent to LLM:".to_string());
    for line in snapshot.context_sent_to_llm.lines() {
        lines.push(format!("  {line}"));
    }

    return lines.join("\n");
}

fn flush() {
    let _ = std::io::stdout().flush();
}

fn print_error(message: &str) {
    println!("{}", Paint::red(format!("Error: {message}")));
}

fn print_prompt() {
    print!("{} ", Paint::cyan(">").bold());
    flush();
}

/// Drops the held task once its turn is over. An `Idle` rendered late may
/// belong to an earlier turn, so the session decides, not the update.
fn forget_settled(task: &mut Option<QueryTask>, session: &ChatSession) {
    let in_flight = match task.as_ref() {
        Some(task) => {
            !task.is_finished()
                && task.turn_id() == session.turn_id()
                && session.state().is_busy()
        }
        None => false,
    };

    if !in_flight {
        *task = None;
    }
}

struct Console {
    api: Arc<ApiClient>,
    chat: ChatService,
    registry: DocumentRegistry,
    recorder: Option<RecordingController>,
    pending: PendingQuery,
    task: Option<QueryTask>,
    show_debug: bool,
}

impl Console {
    fn new(api: Arc<ApiClient>) -> Result<Console> {
        let registry = DocumentRegistry::new(
            api.clone(),
            Config::get_duration(ConfigKey::RefreshDelay)?,
        );

        return Ok(Console {
            chat: ChatService::new(api.clone()),
            api,
            registry,
            recorder: None,
            pending: PendingQuery::default(),
            task: None,
            show_debug: false,
        });
    }

    async fn mount(&mut self) {
        println!("{}", Paint::new("GuardRail AI").bold());
        if self.api.credentials().get_token().is_none() {
            println!(
                "{}",
                Paint::yellow("You are not logged in. Run `guardrail login` first.")
            );
        }

        match self.registry.refresh().await {
            Ok(documents) => println!("{} documents in your knowledge base.", documents.len()),
            Err(err) => print_error(&format!("Could not load documents: {err:#}")),
        }
        println!("Type /help for commands.");
    }

    /// Returns false when the console should exit.
    async fn handle_line(&mut self, line: &str) -> bool {
        if let Some(cmd) = SlashCommand::parse(line) {
            return self.handle_command(cmd).await;
        }

        let query = if line.trim().is_empty() {
            if self.pending.is_empty() {
                print_prompt();
                return true;
            }
            self.pending.take()
        } else {
            line.to_string()
        };

        self.send(&query).await;
        return true;
    }

    async fn send(&mut self, query: &str) {
        match self.chat.send_query(query).await {
            Ok(task) => self.task = Some(task),
            Err(err) => {
                print_error(&format!("{err:#}"));
                print_prompt();
            }
        }
    }

    async fn handle_command(&mut self, cmd: SlashCommand) -> bool {
        if cmd.is_quit() {
            return false;
        }

        if cmd.is_help() {
            println!("{}", help_text());
        } else if cmd.is_voice() {
            self.toggle_recording(cmd.arg()).await;
        } else if cmd.is_upload() {
            match cmd.arg() {
                Some(file) => self.upload(&file).await,
                None => print_error("Usage: /upload <file>"),
            }
        } else if cmd.is_documents() {
            self.print_documents();
        } else if cmd.is_delete() {
            match cmd.arg() {
                Some(id) => self.delete(&id).await,
                None => print_error("Usage: /delete <id>"),
            }
        } else if cmd.is_debug() {
            self.show_debug = !self.show_debug;
            let status = if self.show_debug { "on" } else { "off" };
            println!("Debug panel {status}");
            if self.show_debug {
                if let Some(snapshot) = self.chat.session().lock().await.debug() {
                    println!("{}", Paint::new(format_debug(snapshot)).dimmed());
                }
            }
        } else if cmd.is_cancel() {
            match self.task.take() {
                Some(task) if !task.is_finished() => {
                    task.cancel().await;
                }
                _ => {
                    println!("Nothing to cancel");
                    print_prompt();
                }
            }
            return true;
        }

        print_prompt();
        return true;
    }

    async fn toggle_recording(&mut self, file: Option<String>) {
        let is_recording = self
            .recorder
            .as_ref()
            .map(|recorder| return recorder.is_recording())
            .unwrap_or(false);

        if is_recording {
            if file.is_some() {
                print_error("Already recording. Run /voice to stop.");
                return;
            }
            self.stop_recording().await;
            return;
        }

        let input: Arc<dyn AudioInput> = match file {
            Some(file) => Arc::new(FileAudioInput::new(PathBuf::from(file))),
            None => match audio::default_input() {
                Ok(input) => input,
                Err(err) => {
                    print_error(&format!("{err:#}"));
                    return;
                }
            },
        };

        let microphone = Microphone::new(input);
        let mut recorder = RecordingController::new(microphone, self.api.clone());
        match recorder.start().await {
            Ok(()) => {
                println!("{}", Paint::red("Recording... run /voice to stop."));
                self.recorder = Some(recorder);
            }
            Err(err) => print_error(&format!("{err:#}")),
        }
    }

    async fn stop_recording(&mut self) {
        let mut recorder = match self.recorder.take() {
            Some(recorder) => recorder,
            None => return,
        };

        // Microphone audio is only handed over once the device stops.
        match recorder.recorded_bytes() {
            0 => println!("Transcribing..."),
            bytes => println!("Transcribing {bytes} bytes..."),
        }
        match recorder.stop(&mut self.pending).await {
            Ok(()) => println!(
                "Pending question: {}\nPress Enter to send it.",
                Paint::new(self.pending.text()).bold()
            ),
            Err(err) => print_error(&format!("{err:#}")),
        }
    }

    async fn upload(&mut self, file: &str) {
        println!("Uploading {file}...");
        match self.registry.upload(Path::new(file)).await {
            Ok(receipt) => {
                println!(
                    "Uploaded (ID: {}), status: {}",
                    receipt.document_id, receipt.status
                );
                self.print_documents();
            }
            Err(err) => print_error(&format!("{err:#}")),
        }
    }

    async fn delete(&mut self, id: &str) {
        match self.registry.delete(id).await {
            Ok(()) => {
                println!("Deleted document {id}");
                self.print_documents();
            }
            Err(err) => print_error(&format!("{err:#}")),
        }
    }

    fn print_documents(&self) {
        if self.registry.documents().is_empty() {
            println!("No documents.");
            return;
        }

        for document in self.registry.documents() {
            println!("{}", format_document(document));
        }
    }

    async fn render(&mut self, update: ChatUpdate) {
        match update {
            ChatUpdate::State(ChatState::Awaiting) => {
                print!("{} ", Paint::green("GuardRail:").bold());
                flush();
            }
            ChatUpdate::State(ChatState::Settled) => {
                println!();
                self.render_settled().await;
            }
            ChatUpdate::State(ChatState::Idle) => {
                let session = self.chat.session();
                forget_settled(&mut self.task, &*session.lock().await);
                print_prompt();
            }
            ChatUpdate::State(ChatState::Streaming) => {}
            ChatUpdate::Token(token) => {
                print!("{token}");
                flush();
            }
            // Shown once the answer settles, since it may arrive between tokens.
            ChatUpdate::Debug(_) => {}
            ChatUpdate::ServerError(message) => {
                println!();
                print_error(&message);
            }
        }
    }

    async fn render_settled(&self) {
        let session = self.chat.session();
        let session = session.lock().await;

        match session.last_outcome() {
            Some(TurnOutcome::Failed(message)) => print_error(message),
            Some(TurnOutcome::Cancelled) => println!("{}", Paint::yellow("(cancelled)")),
            _ => {}
        }

        if self.show_debug {
            if let Some(snapshot) = session.debug() {
                println!("{}", Paint::new(format_debug(snapshot)).dimmed());
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.cancel();
        }
        self.recorder = None;
    }
}

pub async fn start() -> Result<()> {
    let api = Arc::new(ApiClient::from_config(Arc::new(FileCredentials::default()))?);
    let mut console = Console::new(api)?;
    let mut updates: mpsc::UnboundedReceiver<ChatUpdate> = console.chat.subscribe().await;

    console.mount().await;
    print_prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !console.handle_line(&line).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(update) = updates.recv() => {
                console.render(update).await;
            }
        }
    }

    console.shutdown();
    if let Some(task) = console.task.take() {
        task.cancel().await;
    }

    return Ok(());
}
