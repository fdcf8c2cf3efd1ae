#[cfg(test)]
#[path = "microphone_test.rs"]
mod tests;

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use cpal::traits::HostTrait;
use cpal::traits::StreamTrait;
use cpal::FromSample;
use cpal::Sample;
use cpal::SizedSample;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use super::wav::downmix;
use super::wav::samples_to_wav;
use crate::domain::models::AudioInput;
use crate::domain::models::Capture;
use crate::domain::models::MediaTrack;

const MIME_TYPE: &str = "audio/wav";

type Samples = Arc<Mutex<Vec<f32>>>;

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Samples,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let frames = data
                .iter()
                .copied()
                .map(|sample| return sample.to_sample::<f32>())
                .collect::<Vec<f32>>();
            if let Ok(mut samples) = samples.lock() {
                samples.extend(downmix(&frames, channels));
            }
        },
        |err| {
            tracing::error!(error = ?err, "Microphone stream failed");
        },
        None,
    )?;

    return Ok(stream);
}

fn open_stream(samples: Samples) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No input device is available")?;
    let supported = device
        .default_input_config()
        .context("Could not read the input device configuration")?;

    let sample_rate = supported.sample_rate().0;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, samples)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, samples)?,
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, samples)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, samples)?,
        other => bail!("Unsupported input sample format {other:?}"),
    };
    stream.play().context("Could not start the input stream")?;

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate,
        channels = config.channels,
        "microphone opened"
    );

    return Ok((stream, sample_rate));
}

/// Sends the whole recording as one WAV chunk. An empty recording sends
/// nothing.
fn deliver(samples: &[f32], sample_rate: u32, chunks: &mpsc::UnboundedSender<Vec<u8>>) {
    if samples.is_empty() {
        return;
    }

    match samples_to_wav(samples, sample_rate) {
        Ok(wav) => {
            tracing::debug!(
                samples = samples.len(),
                bytes = wav.len(),
                "microphone recording encoded"
            );
            let _ = chunks.send(wav);
        }
        Err(err) => tracing::error!(error = ?err, "Could not encode the recording"),
    }
}

/// Runs on its own thread since a cpal stream cannot move between threads.
fn capture(
    ready: oneshot::Sender<Result<()>>,
    stop: std_mpsc::Receiver<()>,
    chunks: mpsc::UnboundedSender<Vec<u8>>,
) {
    let samples = Samples::default();
    let (stream, sample_rate) = match open_stream(samples.clone()) {
        Ok(opened) => opened,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        return;
    }

    // Returns on stop, or once the track is gone.
    let _ = stop.recv();
    drop(stream);

    let samples = match samples.lock() {
        Ok(mut samples) => std::mem::take(&mut *samples),
        Err(_) => vec![],
    };
    deliver(&samples, sample_rate, &chunks);
}

struct MicrophoneTrack {
    stop: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MediaTrack for MicrophoneTrack {
    /// Closes the stream and waits for the recording to be handed over.
    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Microphone thread panicked");
            }
        }
    }
}

impl Drop for MicrophoneTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Records from the system's default input device. The recording is
/// delivered as a single WAV chunk once the track stops.
#[derive(Default)]
pub struct MicrophoneInput;

#[async_trait]
impl AudioInput for MicrophoneInput {
    #[allow(clippy::implicit_return)]
    async fn open(&self) -> Result<Capture> {
        let (chunks_tx, chunks_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("guardrail-microphone".to_string())
            .spawn(move || {
                capture(ready_tx, stop_rx, chunks_tx);
            })
            .context("Could not start the microphone thread")?;

        ready_rx
            .await
            .map_err(|_| return anyhow!("Microphone thread exited before opening the device"))??;

        return Ok(Capture {
            mime_type: MIME_TYPE.to_string(),
            chunks: chunks_rx,
            tracks: vec![Box::new(MicrophoneTrack {
                stop: Some(stop_tx),
                thread: Some(thread),
            })],
        });
    }
}
