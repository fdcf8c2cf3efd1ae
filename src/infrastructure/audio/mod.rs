mod file;
#[cfg(feature = "microphone")]
mod microphone;
#[cfg(feature = "microphone")]
mod wav;

pub use file::*;
#[cfg(feature = "microphone")]
pub use microphone::*;

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::AudioInput;

/// The system's default input device.
#[cfg(feature = "microphone")]
pub fn default_input() -> Result<Arc<dyn AudioInput>> {
    return Ok(Arc::new(MicrophoneInput::default()));
}

#[cfg(not(feature = "microphone"))]
pub fn default_input() -> Result<Arc<dyn AudioInput>> {
    anyhow::bail!("Built without microphone support. Record from a file with /voice <file> instead.");
}
