#[cfg(test)]
#[path = "wav_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::Context;
use anyhow::Result;
use hound::SampleFormat;
use hound::WavSpec;
use hound::WavWriter;

/// Averages interleaved frames down to one channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }

    return data
        .chunks(channels)
        .map(|frame| return frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
}

/// Encodes mono samples in [-1.0, 1.0] as an in-memory 16-bit PCM WAV file.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, spec).context("Failed to create WAV writer")?;

        for &sample in samples {
            let sample = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(sample).context("Failed to write sample")?;
        }

        writer.finalize().context("Failed to finalize WAV")?;
    }

    return Ok(buffer.into_inner());
}
