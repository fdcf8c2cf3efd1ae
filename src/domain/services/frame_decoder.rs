#[cfg(test)]
#[path = "frame_decoder_test.rs"]
mod tests;

use std::borrow::Cow;
use std::collections::VecDeque;

use anyhow::Result;
use futures::StreamExt;

use crate::domain::models::ByteStream;

/// Splits newline delimited records out of arbitrarily sized chunks.
///
/// A record cut by a chunk boundary stays in the buffer until its newline
/// arrives. Blank lines are dropped.
#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

fn to_frame(bytes: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(err) => {
            tracing::debug!(
                error = ?err,
                length = bytes.len(),
                "Replacing invalid UTF-8 in stream record"
            );
            String::from_utf8_lossy(bytes)
        }
    };

    let line = text.strip_suffix('\r').unwrap_or(&text);
    if line.trim().is_empty() {
        return None;
    }

    return Some(line.to_string());
}

impl FrameDecoder {
    /// Feeds one chunk and returns every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = vec![];
        // Only the new bytes can contain the next newline.
        let mut search_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.buffer[search_from..]
            .iter()
            .position(|byte| return *byte == b'\n')
        {
            let end = search_from + offset;
            if let Some(line) = to_frame(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
            search_from = start;
        }

        // Completed records leave the buffer in one pass.
        self.buffer.drain(..start);

        return lines;
    }

    /// Flushes whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        return to_frame(&rest);
    }

    pub fn buffered(&self) -> usize {
        return self.buffer.len();
    }
}

/// Lazily decodes lines out of a response body. Once it has returned
/// `Ok(None)` or an error, it keeps returning `Ok(None)`.
pub struct FrameStream {
    body: ByteStream,
    decoder: FrameDecoder,
    ready: VecDeque<String>,
    done: bool,
}

impl FrameStream {
    pub fn new(body: ByteStream) -> FrameStream {
        return FrameStream {
            body,
            decoder: FrameDecoder::default(),
            ready: VecDeque::new(),
            done: false,
        };
    }

    pub async fn next(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }

            if self.done {
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    self.ready.extend(self.decoder.push(&chunk));
                }
                Some(Err(err)) => {
                    self.done = true;
                    tracing::error!(
                        error = ?err,
                        buffered = self.decoder.buffered(),
                        "Response body failed mid stream"
                    );
                    return Err(err);
                }
                None => {
                    self.done = true;
                    if let Some(line) = self.decoder.finish() {
                        return Ok(Some(line));
                    }
                }
            }
        }
    }
}
