#[cfg(test)]
#[path = "recording_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use tokio::sync::mpsc::error::TryRecvError;

use crate::domain::models::AudioBlob;
use crate::domain::models::AudioInput;
use crate::domain::models::Capture;
use crate::domain::models::PendingQuery;
use crate::domain::models::RecordingState;
use crate::domain::models::Transcriber;

/// Held while a capture owns the microphone. Dropping it frees the device for
/// the next recorder.
pub struct MicrophoneClaim {
    in_use: Arc<AtomicBool>,
}

impl Drop for MicrophoneClaim {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::SeqCst);
    }
}

/// Exclusive-use wrapper around an audio input. Clones share the same device.
#[derive(Clone)]
pub struct Microphone {
    input: Arc<dyn AudioInput>,
    in_use: Arc<AtomicBool>,
}

impl Microphone {
    pub fn new(input: Arc<dyn AudioInput>) -> Microphone {
        return Microphone {
            input,
            in_use: Arc::new(AtomicBool::new(false)),
        };
    }

    pub fn in_use(&self) -> bool {
        return self.in_use.load(Ordering::SeqCst);
    }

    fn acquire(&self) -> Result<MicrophoneClaim> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            bail!("Microphone is already in use");
        }

        return Ok(MicrophoneClaim {
            in_use: self.in_use.clone(),
        });
    }

    pub async fn open(&self) -> Result<CaptureHandle> {
        let claim = self.acquire()?;
        let capture = self.input.open().await?;

        return Ok(CaptureHandle {
            capture,
            claim: Some(claim),
        });
    }
}

/// An open capture plus its claim on the microphone.
pub struct CaptureHandle {
    capture: Capture,
    claim: Option<MicrophoneClaim>,
}

impl CaptureHandle {
    pub fn mime_type(&self) -> &str {
        return &self.capture.mime_type;
    }

    /// Takes every chunk that has arrived so far without waiting.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut chunks = vec![];
        loop {
            match self.capture.chunks.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        return chunks;
    }

    /// Stops every track and frees the microphone. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.claim.is_none() {
            return;
        }

        for track in self.capture.tracks.iter_mut() {
            track.stop();
        }

        self.claim = None;
        tracing::debug!(tracks = self.capture.tracks.len(), "microphone released");
    }

    pub fn is_released(&self) -> bool {
        return self.claim.is_none();
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct RecordingSession {
    handle: CaptureHandle,
    chunks: Vec<Vec<u8>>,
}

impl RecordingSession {
    fn new(handle: CaptureHandle) -> RecordingSession {
        return RecordingSession {
            handle,
            chunks: vec![],
        };
    }

    pub fn collect(&mut self) {
        let chunks = self.handle.drain();
        self.chunks
            .extend(chunks.into_iter().filter(|chunk| return !chunk.is_empty()));
    }

    pub fn recorded_bytes(&self) -> usize {
        return self.chunks.iter().map(|chunk| return chunk.len()).sum();
    }

    /// Releases the device, picks up the last chunks delivered before the
    /// tracks stopped, and joins everything into one blob.
    pub fn finish(mut self) -> AudioBlob {
        self.collect();
        self.handle.release();
        self.collect();

        let mime_type = self.handle.mime_type().to_string();
        let data = std::mem::take(&mut self.chunks).concat();

        return AudioBlob::new(data, &mime_type);
    }
}

pub struct RecordingController {
    microphone: Microphone,
    transcriber: Arc<dyn Transcriber>,
    state: RecordingState,
    session: Option<RecordingSession>,
}

impl RecordingController {
    pub fn new(microphone: Microphone, transcriber: Arc<dyn Transcriber>) -> RecordingController {
        return RecordingController {
            microphone,
            transcriber,
            state: RecordingState::Idle,
            session: None,
        };
    }

    pub fn state(&self) -> RecordingState {
        return self.state;
    }

    pub fn is_recording(&self) -> bool {
        return self.state == RecordingState::Recording;
    }

    pub fn recorded_bytes(&mut self) -> usize {
        if let Some(session) = self.session.as_mut() {
            session.collect();
            return session.recorded_bytes();
        }

        return 0;
    }

    /// Starts capturing. Calling it while already recording does nothing.
    pub async fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let handle = self
            .microphone
            .open()
            .await
            .context("Could not access the microphone")?;

        tracing::debug!(mime_type = handle.mime_type(), "recording started");
        self.session = Some(RecordingSession::new(handle));
        self.state = RecordingState::Recording;

        return Ok(());
    }

    /// Stops capturing and transcribes what was recorded into `pending`. The
    /// device is released before the upload starts. A no-op while not
    /// recording.
    pub async fn stop(&mut self, pending: &mut PendingQuery) -> Result<()> {
        let session = match self.session.take() {
            Some(session) => session,
            None => return Ok(()),
        };

        self.state = RecordingState::Finalizing;
        let blob = session.finish();

        if blob.is_empty() {
            self.state = RecordingState::Idle;
            bail!("No audio was recorded");
        }

        tracing::debug!(
            bytes = blob.data.len(),
            file_name = blob.file_name.as_str(),
            "uploading recording"
        );

        let res = self.transcriber.transcribe(blob).await;
        self.state = RecordingState::Idle;

        let text = res.context("Transcription failed")?;
        pending.set(&text);

        return Ok(());
    }

    /// Drops the capture without transcribing it.
    pub fn cancel(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.handle.release();
            tracing::debug!("recording cancelled");
        }

        self.state = RecordingState::Idle;
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.cancel();
    }
}
