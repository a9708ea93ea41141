//! Server-sent-events frame parsing for the chat endpoint.
//!
//! The backend streams frames shaped like
//! `data: {"choices":[{"delta":{"content":"..."}}]}` separated by blank
//! lines and terminated by `data: [DONE]`. Some proxies emit the final
//! message as `choices[0].message.content` instead of a delta; both shapes
//! are accepted. Control frames never reach the caller.

use serde_json::Value;

/// Incremental SSE decoder. Bytes arrive in arbitrary chunk boundaries;
/// `push` buffers them, splits on newlines, and emits one content fragment
/// per complete data frame.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    event_data: String,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal `[DONE]` frame has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of bytes, invoking `emit` for each content fragment.
    /// Invalid UTF-8 at a chunk boundary is replaced rather than erroring;
    /// the backend sends UTF-8 and split code points are vanishingly rare
    /// in practice with lossy recovery.
    pub fn push(&mut self, chunk: &[u8], mut emit: impl FnMut(&str)) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = line.strip_prefix("data:") {
                if !self.event_data.is_empty() {
                    self.event_data.push('\n');
                }
                self.event_data.push_str(data.trim_start());
            } else if line.is_empty() && !self.event_data.is_empty() {
                let frame = std::mem::take(&mut self.event_data);
                self.dispatch(&frame, &mut emit);
            }
        }
    }

    /// Flush any trailing frame once the stream ends without a final blank
    /// line.
    pub fn finish(&mut self, mut emit: impl FnMut(&str)) {
        if !self.event_data.is_empty() {
            let frame = std::mem::take(&mut self.event_data);
            self.dispatch(&frame, &mut emit);
        }
    }

    fn dispatch(&mut self, frame: &str, emit: &mut impl FnMut(&str)) {
        if frame == "[DONE]" {
            self.done = true;
            return;
        }
        if let Some(content) = frame_content(frame) {
            if !content.is_empty() {
                emit(&content);
            }
        }
    }
}

/// Extract the content fragment from one data frame, if any.
fn frame_content(frame: &str) -> Option<String> {
    let value: Value = serde_json::from_str(frame).ok()?;
    let choice = value.get("choices")?.get(0)?;
    let content = choice
        .get("delta")
        .and_then(|d| d.get("content"))
        .or_else(|| choice.get("message").and_then(|m| m.get("content")))?;
    content.as_str().map(str::to_string)
}
