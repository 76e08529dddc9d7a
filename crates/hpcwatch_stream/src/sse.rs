//! Incremental decoder for `text/event-stream` bodies.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// Longest line kept in memory. Longer lines are dropped together with the
/// frame they belong to.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Turns body chunks into frames. Chunk boundaries may fall anywhere,
/// including inside a multi-byte character.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    /// Inside an over-long line whose head was already dropped.
    overlong: bool,
    current: SseFrame,
    has_data: bool,
    poisoned: bool,
    discarded: u64,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            let Some(offset) = self.pending[self.scanned..]
                .iter()
                .position(|b| *b == b'\n')
            else {
                self.scanned = self.pending.len();
                break;
            };
            let mut line: Vec<u8> = self.pending.drain(..=self.scanned + offset).collect();
            self.scanned = 0;
            if std::mem::take(&mut self.overlong) {
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(frame) = self.feed_line(&line) {
                frames.push(frame);
            }
        }
        if self.pending.len() > MAX_LINE_BYTES {
            self.pending.clear();
            self.scanned = 0;
            self.overlong = true;
            self.poisoned = true;
        }
        frames
    }

    /// Frames dropped because a line was not valid UTF-8 or exceeded
    /// [`MAX_LINE_BYTES`].
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn feed_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        let Ok(line) = std::str::from_utf8(line) else {
            self.poisoned = true;
            return None;
        };
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                if self.has_data {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.current.event = Some(value.to_string()),
            "id" => self.current.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let frame = std::mem::take(&mut self.current);
        let had_data = std::mem::replace(&mut self.has_data, false);
        if std::mem::replace(&mut self.poisoned, false) {
            self.discarded += 1;
            return None;
        }
        if !had_data && frame.event.is_none() {
            return None;
        }
        Some(frame)
    }
}
