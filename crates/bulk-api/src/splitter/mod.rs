//! Lazy line segmentation over chunked input.
//!
//! Input arrives in arbitrary chunks. A line may straddle any number of chunk
//! boundaries, so the [`Segmenter`] keeps the trailing partial segment of each
//! chunk and prepends it to the next one before scanning for terminators.
//! Empty lines are discarded and terminators are stripped.
//!
//! The same segmentation runs over bytes ([`split_bytes`], terminator `b'\n'`)
//! and over characters ([`split_text`], terminator `'\n'`), so both variants
//! produce identical lines regardless of how the input was chunked.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::{self, Read};
use std::str::Chars;

/// Chunk size used when the caller does not supply one.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Line terminator for NDJSON byte streams.
pub const BYTE_TERMINATOR: u8 = b'\n';

/// Line terminator for NDJSON text.
pub const CHAR_TERMINATOR: char = '\n';

/// Incremental segmentation state shared by the byte and text splitters.
#[derive(Debug, Clone)]
pub struct Segmenter<T> {
    terminator: T,
    partial: Vec<T>,
}

impl<T: Copy + PartialEq> Segmenter<T> {
    /// Creates a segmenter that splits on `terminator`.
    #[must_use]
    pub const fn new(terminator: T) -> Self {
        Self {
            terminator,
            partial: Vec::new(),
        }
    }

    /// Scans a chunk and queues every line it completes.
    ///
    /// The segment after the last terminator is buffered until a later chunk
    /// (or [`Segmenter::finish`]) completes it.
    pub fn feed(&mut self, chunk: &[T], ready: &mut VecDeque<Vec<T>>) {
        let mut rest = chunk;
        while let Some(index) = rest.iter().position(|item| *item == self.terminator) {
            let (head, tail) = rest.split_at(index);
            self.partial.extend_from_slice(head);
            let line = std::mem::take(&mut self.partial);
            if !line.is_empty() {
                ready.push_back(line);
            }
            rest = tail.get(1..).unwrap_or_default();
        }
        self.partial.extend_from_slice(rest);
    }

    /// Flushes the buffered segment at end of input.
    ///
    /// Returns `None` when the input ended with a terminator.
    pub fn finish(&mut self) -> Option<Vec<T>> {
        let line = std::mem::take(&mut self.partial);
        (!line.is_empty()).then_some(line)
    }

    /// Returns the number of buffered items awaiting a terminator.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.partial.len()
    }
}

/// Lazy sequence of lines segmented from a fallible chunk source.
///
/// Each call to `next` pulls at most as many chunks as are needed to complete
/// one line. A chunk error is yielded once and ends the sequence.
#[derive(Debug)]
pub struct SplitLines<I, T> {
    chunks: I,
    segmenter: Segmenter<T>,
    ready: VecDeque<Vec<T>>,
    exhausted: bool,
}

impl<I, T: Copy + PartialEq> SplitLines<I, T> {
    /// Wraps a chunk source, splitting on `terminator`.
    #[must_use]
    pub const fn new(chunks: I, terminator: T) -> Self {
        Self {
            chunks,
            segmenter: Segmenter::new(terminator),
            ready: VecDeque::new(),
            exhausted: false,
        }
    }
}

impl<I, C, E, T> Iterator for SplitLines<I, T>
where
    I: Iterator<Item = Result<C, E>>,
    C: AsRef<[T]>,
    T: Copy + PartialEq,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if self.exhausted {
                return None;
            }
            match self.chunks.next() {
                Some(Ok(chunk)) => self.segmenter.feed(chunk.as_ref(), &mut self.ready),
                Some(Err(error)) => {
                    self.exhausted = true;
                    return Some(Err(error));
                }
                None => {
                    self.exhausted = true;
                    return self.segmenter.finish().map(Ok);
                }
            }
        }
    }
}

/// Reads a byte source in fixed-size chunks.
#[derive(Debug)]
pub struct ReadChunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ReadChunks<R> {
    /// Creates a chunk reader; a `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl<R: Read> Iterator for ReadChunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = vec![0_u8; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(read) => {
                    chunk.truncate(read);
                    return Some(Ok(chunk));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Splits a byte stream into non-empty lines.
///
/// # Example
///
/// ```
/// use bulk_api::splitter::split_bytes;
///
/// let input: &[u8] = b"\nline_1\n\nlong_middle_line_2\nline_3";
/// let lines: Vec<Vec<u8>> = split_bytes(input, 8).collect::<Result<_, _>>()?;
/// assert_eq!(
///     lines,
///     vec![b"line_1".to_vec(), b"long_middle_line_2".to_vec(), b"line_3".to_vec()]
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn split_bytes<R: Read>(reader: R, chunk_size: usize) -> SplitLines<ReadChunks<R>, u8> {
    SplitLines::new(ReadChunks::new(reader, chunk_size), BYTE_TERMINATOR)
}

/// Splits pre-chunked input into non-empty lines.
pub fn split_chunks<I, C, E, T>(chunks: I, terminator: T) -> SplitLines<I::IntoIter, T>
where
    I: IntoIterator<Item = Result<C, E>>,
    C: AsRef<[T]>,
    T: Copy + PartialEq,
{
    SplitLines::new(chunks.into_iter(), terminator)
}

/// Feeds text to the segmenter a fixed number of characters at a time.
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    chars: Chars<'a>,
    chunk_size: usize,
}

impl<'a> TextChunks<'a> {
    /// Creates a chunker over `text`; a `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(text: &'a str, chunk_size: usize) -> Self {
        Self {
            chars: text.chars(),
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Iterator for TextChunks<'_> {
    type Item = Result<Vec<char>, Infallible>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<char> = self.chars.by_ref().take(self.chunk_size).collect();
        (!chunk.is_empty()).then_some(Ok(chunk))
    }
}

/// Lazy sequence of non-empty lines of a string.
#[derive(Debug)]
pub struct TextLines<'a> {
    inner: SplitLines<TextChunks<'a>, char>,
}

impl Iterator for TextLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let Ok(line) = self.inner.next()?;
        Some(line.into_iter().collect())
    }
}

/// Splits text into non-empty lines.
///
/// # Example
///
/// ```
/// use bulk_api::splitter::split_text;
///
/// let lines: Vec<String> = split_text("\nline_1\n\nline_2\n", 4).collect();
/// assert_eq!(lines, vec!["line_1", "line_2"]);
/// ```
#[must_use]
pub fn split_text(text: &str, chunk_size: usize) -> TextLines<'_> {
    TextLines {
        inner: SplitLines::new(TextChunks::new(text, chunk_size), CHAR_TERMINATOR),
    }
}

#[cfg(test)]
mod tests;
