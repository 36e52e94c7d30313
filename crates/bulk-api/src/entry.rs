//! Pipeline entry point.
//!
//! [`BulkApi`] binds an executor, an observer and processing options, then
//! chains splitter, decoder, processor and encoder for each input shape. Every
//! decode-side method returns a lazy sequence of encoded result lines; nothing
//! is read or executed until that sequence is pulled.

use std::io::Read;

use crate::decoder::{CommandDecoder, decode_byte_stream, decode_string, is_blank_line};
use crate::encoder::encode_line;
use crate::error::BulkError;
use crate::executor::{Executor, ExecutorRegistry};
use crate::model::{Command, CommandResult};
use crate::observer::{NoopObserver, Observer};
use crate::processor::{CommandProcessor, ProcessedCommands, ProcessorOptions};
use crate::splitter::DEFAULT_CHUNK_SIZE;

/// Entry point of the bulk pipeline.
///
/// # Example
///
/// ```
/// use bulk_api::{AutomaticReportExecutor, BulkApi};
///
/// let input = "[\"config\",{}]\n[\"create\",\"user\",{\"name\":\"a\"}]\n";
/// let lines = BulkApi::new(&AutomaticReportExecutor)
///     .run_string(input)
///     .collect::<Result<Vec<_>, _>>()?;
///
/// assert_eq!(lines.len(), 2);
/// assert_eq!(
///     lines[1],
///     b"{\"id\":1,\"status\":\"success\",\"data\":{\"id\":\"user_1\",\"type\":\"user\"}}\n"
/// );
/// # Ok::<(), bulk_api::BulkError>(())
/// ```
pub struct BulkApi<'a, E: ?Sized, O: ?Sized = NoopObserver> {
    executor: &'a E,
    observer: &'a O,
    options: ProcessorOptions,
    chunk_size: usize,
}

impl<E: ?Sized, O: ?Sized> Clone for BulkApi<'_, E, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized, O: ?Sized> Copy for BulkApi<'_, E, O> {}

impl<'a, E: Executor + ?Sized> BulkApi<'a, E> {
    /// Creates an entry point bound to `executor` with the no-op observer and
    /// default options.
    #[must_use]
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            observer: &NoopObserver,
            options: ProcessorOptions::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl<'a> BulkApi<'a, dyn Executor + 'a> {
    /// Creates an entry point bound to the executor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::ContractViolation`] when no executor is registered
    /// under `name`. No input has been touched at that point.
    pub fn from_registry(registry: &'a ExecutorRegistry, name: &str) -> Result<Self, BulkError> {
        let executor = registry.resolve(name)?;
        Ok(BulkApi::new(executor))
    }
}

impl<'a, E, O> BulkApi<'a, E, O>
where
    E: Executor + ?Sized,
    O: Observer + ?Sized,
{
    /// Replaces the observer.
    ///
    /// ```
    /// use bulk_api::{AutomaticReportExecutor, BulkApi, TracingObserver};
    ///
    /// let _ = BulkApi::new(&AutomaticReportExecutor).with_observer(&TracingObserver);
    /// ```
    ///
    /// The observer capability is checked by the compiler as well, so a value
    /// that does not implement [`Observer`] is rejected before any input
    /// exists:
    ///
    /// ```compile_fail
    /// use bulk_api::{AutomaticReportExecutor, BulkApi};
    ///
    /// let not_an_observer = "not an observer";
    /// let _ = BulkApi::new(&AutomaticReportExecutor).with_observer(&not_an_observer);
    /// ```
    #[must_use]
    pub const fn with_observer<P: Observer + ?Sized>(self, observer: &'a P) -> BulkApi<'a, E, P> {
        BulkApi {
            executor: self.executor,
            observer,
            options: self.options,
            chunk_size: self.chunk_size,
        }
    }

    /// Replaces the processing options.
    #[must_use]
    pub const fn with_options(mut self, options: ProcessorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the read size for byte streams. Zero is treated as one.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 { 1 } else { chunk_size };
        self
    }

    /// Returns the processing options.
    #[must_use]
    pub const fn options(&self) -> ProcessorOptions {
        self.options
    }

    /// Returns the byte-stream read size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Processes already-decoded commands, yielding typed result records.
    pub fn process<I>(self, commands: I) -> ProcessedCommands<'a, I::IntoIter, E, O>
    where
        I: IntoIterator<Item = Result<Command, BulkError>>,
    {
        CommandProcessor::new(self.executor, self.observer, self.options).process(commands)
    }

    /// Runs a batch given as separate lines.
    ///
    /// Blank and whitespace-only lines are skipped without taking a
    /// position, matching the splitter and decoder on text input.
    pub fn run_lines<I>(self, lines: I) -> impl Iterator<Item = Result<Vec<u8>, BulkError>> + 'a
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]> + 'a,
        I::IntoIter: 'a,
    {
        let non_blank = lines
            .into_iter()
            .filter(|line| !is_blank_line(AsRef::<[u8]>::as_ref(line)))
            .map(Ok::<_, BulkError>);
        self.encode(self.process(CommandDecoder::new(non_blank)))
    }

    /// Runs a batch given as one NDJSON string.
    pub fn run_string(self, text: &'a str) -> impl Iterator<Item = Result<Vec<u8>, BulkError>> + 'a {
        self.encode(self.process(decode_string(text)))
    }

    /// Runs a batch read incrementally from a byte stream.
    pub fn run_byte_stream<R>(self, reader: R) -> impl Iterator<Item = Result<Vec<u8>, BulkError>> + 'a
    where
        R: Read + 'a,
    {
        self.encode(self.process(decode_byte_stream(reader, self.chunk_size)))
    }

    fn encode<I>(self, results: I) -> impl Iterator<Item = Result<Vec<u8>, BulkError>> + 'a
    where
        I: Iterator<Item = Result<CommandResult, BulkError>> + 'a,
    {
        results.map(|result| result.and_then(|record| encode_line(&record)))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::executor::{AutomaticReportExecutor, REPORT_EXECUTOR};

    const INPUT: &str = "[\"config\",{}]\n[\"create\",\"user\",{\"name\":\"a\"}]\n";

    #[test]
    fn zero_chunk_size_is_clamped() {
        let api = BulkApi::new(&AutomaticReportExecutor).with_chunk_size(0);
        assert_eq!(api.chunk_size(), 1);
    }

    #[rstest]
    #[case::one_byte(1)]
    #[case::seven_bytes(7)]
    #[case::default(DEFAULT_CHUNK_SIZE)]
    fn every_entry_shape_agrees(#[case] chunk_size: usize) {
        let api = BulkApi::new(&AutomaticReportExecutor).with_chunk_size(chunk_size);
        let by_string: Vec<Vec<u8>> = api
            .run_string(INPUT)
            .collect::<Result<_, _>>()
            .expect("string");
        let by_bytes: Vec<Vec<u8>> = api
            .run_byte_stream(INPUT.as_bytes())
            .collect::<Result<_, _>>()
            .expect("bytes");
        let by_lines: Vec<Vec<u8>> = api
            .run_lines(INPUT.split('\n'))
            .collect::<Result<_, _>>()
            .expect("lines");

        assert_eq!(by_string.len(), 2);
        assert_eq!(by_string, by_bytes);
        assert_eq!(by_string, by_lines);
    }

    #[test]
    fn blank_crlf_lines_do_not_abort_the_batch() {
        let api = BulkApi::new(&AutomaticReportExecutor);
        let crlf = "[\"config\",{}]\r\n\r\n[\"create\",\"user\",{\"name\":\"a\"}]\r\n";
        let by_string: Vec<Vec<u8>> = api
            .run_string(crlf)
            .collect::<Result<_, _>>()
            .expect("blank CRLF line is skipped");
        let by_lines: Vec<Vec<u8>> = api
            .run_lines(crlf.split('\n'))
            .collect::<Result<_, _>>()
            .expect("carriage-return-only entry is skipped");
        let plain: Vec<Vec<u8>> = api
            .run_string(INPUT)
            .collect::<Result<_, _>>()
            .expect("plain batch");

        assert_eq!(by_string, plain);
        assert_eq!(by_lines, plain);
    }

    #[test]
    fn unknown_executor_name_fails_before_reading() {
        let registry = ExecutorRegistry::with_defaults();
        let error = BulkApi::from_registry(&registry, "postgres")
            .err()
            .expect("unknown executor");
        assert!(matches!(error, BulkError::ContractViolation { .. }));
    }

    #[test]
    fn registry_executor_drives_the_pipeline() {
        let registry = ExecutorRegistry::with_defaults();
        let api = BulkApi::from_registry(&registry, REPORT_EXECUTOR).expect("registered");
        let lines: Vec<Vec<u8>> = api
            .run_string(INPUT)
            .collect::<Result<_, _>>()
            .expect("run");
        assert_eq!(lines.len(), 2);
    }
}
