//! Line-to-command decoding.
//!
//! Each non-blank line is parsed as one JSON value and mapped to a
//! [`Command`]. Lines holding only whitespace (such as the `\r` left by an
//! empty CRLF line) are skipped without taking a position, so the first
//! command of a batch is position 0. Decoding is pure; the first failure ends the
//! sequence because the protocol offers no skip-bad-line mode.

use std::io::Read;

use serde_json::Value;

use crate::error::BulkError;
use crate::model::{Command, CorrelationId};
use crate::splitter::{DEFAULT_CHUNK_SIZE, split_bytes, split_text};

/// Returns `true` when a line holds nothing but ASCII whitespace.
#[must_use]
pub fn is_blank_line(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Decodes one line into a command.
///
/// Trailing whitespace (including a carriage return) is trimmed before
/// parsing. Blank lines are not commands; [`CommandDecoder`] skips them.
///
/// # Errors
///
/// Returns [`BulkError::MalformedJson`] when the line is blank or is not a
/// JSON value, and [`BulkError::MalformedCommand`] when the value does not
/// match a command shape.
pub fn decode_line(position: usize, line: &[u8]) -> Result<Command, BulkError> {
    let trimmed = trim_trailing_whitespace(line);
    if trimmed.is_empty() {
        return Err(BulkError::malformed_json(position, line, "blank line"));
    }

    let raw: Value = serde_json::from_slice(trimmed)
        .map_err(|source| BulkError::from_json_error(position, line, source))?;
    Command::from_value(CorrelationId::new(position), raw)
}

/// Lazy adapter turning a sequence of lines into a sequence of commands.
///
/// Blank lines are skipped and do not advance the position. Upstream errors
/// (for example a failed read) are passed through. After the first error the
/// decoder is exhausted.
#[derive(Debug)]
pub struct CommandDecoder<I> {
    lines: I,
    position: usize,
    failed: bool,
}

impl<I> CommandDecoder<I> {
    /// Wraps a line source.
    #[must_use]
    pub const fn new(lines: I) -> Self {
        Self {
            lines,
            position: 0,
            failed: false,
        }
    }

    /// Returns the position the next decoded line will receive.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl<I, L> Iterator for CommandDecoder<I>
where
    I: Iterator<Item = Result<L, BulkError>>,
    L: AsRef<[u8]>,
{
    type Item = Result<Command, BulkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let decoded = loop {
            match self.lines.next()? {
                Ok(line) if is_blank_line(line.as_ref()) => {}
                Ok(line) => break decode_line(self.position, line.as_ref()),
                Err(error) => break Err(error),
            }
        };
        self.position += 1;
        self.failed = decoded.is_err();
        Some(decoded)
    }
}

/// Decodes commands from NDJSON text.
pub fn decode_string(text: &str) -> impl Iterator<Item = Result<Command, BulkError>> + '_ {
    CommandDecoder::new(split_text(text, DEFAULT_CHUNK_SIZE).map(Ok::<_, BulkError>))
}

/// Decodes commands from an NDJSON byte stream read `chunk_size` bytes at a
/// time.
pub fn decode_byte_stream<R: Read>(
    reader: R,
    chunk_size: usize,
) -> impl Iterator<Item = Result<Command, BulkError>> {
    CommandDecoder::new(split_bytes(reader, chunk_size).map(|line| line.map_err(BulkError::from)))
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
