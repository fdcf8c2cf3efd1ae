use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Finalizing,
}

/// One underlying source of a capture, such as a hardware input channel.
pub trait MediaTrack: Send {
    fn stop(&mut self);
}

/// An opened capture device. Audio data arrives on `chunks` until every track
/// has been stopped.
pub struct Capture {
    pub mime_type: String,
    pub chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    pub tracks: Vec<Box<dyn MediaTrack>>,
}

#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Acquires the device. Fails when the device is missing or access is
    /// denied.
    async fn open(&self) -> Result<Capture>;
}

/// The recorded audio handed off for transcription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioBlob {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioBlob {
    pub fn new(data: Vec<u8>, mime_type: &str) -> AudioBlob {
        // "audio/webm;codecs=opus" -> "webm"
        let extension = mime_type
            .split(';')
            .next()
            .and_then(|essence| return essence.split('/').nth(1))
            .filter(|subtype| return !subtype.trim().is_empty())
            .unwrap_or("webm")
            .trim();

        return AudioBlob {
            data,
            file_name: format!("voice_command.{extension}"),
            mime_type: mime_type.to_string(),
        };
    }

    pub fn is_empty(&self) -> bool {
        return self.data.is_empty();
    }
}

/// Text waiting in the input line to be submitted as the next query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingQuery {
    text: String,
}

impl PendingQuery {
    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn take(&mut self) -> String {
        return std::mem::take(&mut self.text);
    }

    pub fn is_empty(&self) -> bool {
        return self.text.trim().is_empty();
    }
}
