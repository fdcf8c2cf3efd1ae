#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::AudioInput;
use crate::domain::models::Capture;
use crate::domain::models::MediaTrack;

const CHUNK_SIZE: usize = 16 * 1024;

pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| return ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => return "audio/wav",
        "ogg" | "oga" => return "audio/ogg",
        "mp3" => return "audio/mpeg",
        "m4a" | "mp4" => return "audio/mp4",
        "flac" => return "audio/flac",
        _ => return "audio/webm",
    }
}

struct FileTrack {
    stopped: Arc<AtomicBool>,
}

impl MediaTrack for FileTrack {
    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Replays a pre-recorded file as if it were captured live.
pub struct FileAudioInput {
    path: PathBuf,
    stopped: Arc<AtomicBool>,
}

impl FileAudioInput {
    pub fn new(path: PathBuf) -> FileAudioInput {
        return FileAudioInput {
            path,
            stopped: Arc::new(AtomicBool::new(false)),
        };
    }

    /// Whether the last capture opened from this input has been released.
    pub fn is_stopped(&self) -> bool {
        return self.stopped.load(Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioInput for FileAudioInput {
    #[allow(clippy::implicit_return)]
    async fn open(&self) -> Result<Capture> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| return format!("Audio input {} is unavailable", self.path.display()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in data.chunks(CHUNK_SIZE) {
            tx.send(chunk.to_vec())?;
        }

        self.stopped.store(false, Ordering::SeqCst);
        tracing::debug!(path = ?self.path, bytes = data.len(), "audio file opened");

        return Ok(Capture {
            mime_type: mime_type_for(&self.path).to_string(),
            chunks: rx,
            tracks: vec![Box::new(FileTrack {
                stopped: self.stopped.clone(),
            })],
        });
    }
}
