//! NDJSON encoding of commands and result records.
//!
//! Every item becomes one compact JSON document followed by `\n`. Compact
//! `serde_json` output never contains a raw newline, so framing is preserved
//! for any value.

use std::io::Write;

use serde::Serialize;

use crate::error::BulkError;

/// Line terminator appended to every encoded item.
const NEWLINE: u8 = b'\n';

/// Encodes one item as a newline-terminated NDJSON line.
///
/// # Errors
///
/// Returns [`BulkError::Encode`] when the item cannot be serialised.
pub fn encode_line<T: Serialize + ?Sized>(item: &T) -> Result<Vec<u8>, BulkError> {
    let mut line = serde_json::to_vec(item).map_err(BulkError::encode)?;
    line.push(NEWLINE);
    Ok(line)
}

/// Writer that frames serialisable items as NDJSON lines.
pub struct LineWriter<W> {
    writer: W,
    lines: usize,
}

impl<W: Write> LineWriter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Writes one item as an NDJSON line.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Encode`] if serialisation fails, or
    /// [`BulkError::Io`] if writing fails.
    pub fn write_item<T: Serialize + ?Sized>(&mut self, item: &T) -> Result<(), BulkError> {
        let line = encode_line(item)?;
        self.write_encoded(&line)
    }

    /// Writes pre-encoded NDJSON bytes verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Io`] if writing fails.
    pub fn write_encoded(&mut self, line: &[u8]) -> Result<(), BulkError> {
        self.writer.write_all(line)?;
        self.lines += 1;
        Ok(())
    }

    /// Flushes the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Io`] if flushing fails.
    pub fn flush(&mut self) -> Result<(), BulkError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the number of lines written so far.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Writes every item to `writer` as NDJSON and flushes it.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns [`BulkError::Encode`] or [`BulkError::Io`] for the first item that
/// cannot be written; earlier lines stay written.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let mut out = Vec::new();
/// let written = bulk_api::to_stream(&mut out, [json!(["config", {}])])?;
/// assert_eq!(written, 1);
/// assert_eq!(out, b"[\"config\",{}]\n");
/// # Ok::<(), bulk_api::BulkError>(())
/// ```
pub fn to_stream<W, I>(writer: W, items: I) -> Result<usize, BulkError>
where
    W: Write,
    I: IntoIterator,
    I::Item: Serialize,
{
    let mut lines = LineWriter::new(writer);
    for item in items {
        lines.write_item(&item)?;
    }
    lines.flush()?;
    Ok(lines.lines())
}

/// Renders every item as NDJSON text.
///
/// # Errors
///
/// Returns [`BulkError::Encode`] when an item cannot be serialised.
pub fn to_string<I>(items: I) -> Result<String, BulkError>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    let mut text = String::new();
    for item in items {
        text.push_str(&serde_json::to_string(&item).map_err(BulkError::encode)?);
        text.push(char::from(NEWLINE));
    }
    Ok(text)
}
