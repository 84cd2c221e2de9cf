use std::mem;

const LINE_TERMINATOR: char = '\n';
const CARRIAGE_RETURN: char = '\r';

/// Reassembles newline-delimited text lines from a raw serial byte stream.
///
/// Carriage returns are dropped wherever they appear and surrounding
/// whitespace is trimmed from every emitted line. Empty lines are never
/// emitted. The buffer is unbounded.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    partial: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a raw chunk and return every line it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode(chunk);
        let mut lines = Vec::new();

        for ch in text.chars() {
            match ch {
                LINE_TERMINATOR => {
                    let line = mem::take(&mut self.buffer);
                    let line = line.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
                CARRIAGE_RETURN => {}
                _ => self.buffer.push(ch),
            }
        }

        lines
    }

    /// Text buffered since the last terminator
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.partial.is_empty()
    }

    /// Drop any buffered partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.partial.clear();
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end, wait for the next chunk
                            self.partial = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        text
    }
}
