//! Streaming NDJSON bulk command pipeline.
//!
//! A bulk request is a newline-delimited JSON stream in which every line is
//! one command (`["config", {...}]`, `["create", "user", {...}]`, ...). The
//! crate splits the stream into lines, decodes each line into a [`Command`],
//! executes the commands in order through an injected [`Executor`], and
//! re-encodes one result record per command as NDJSON.
//!
//! # Architecture
//!
//! Each stage is a lazy iterator adapter, so memory use is bounded by one
//! in-flight line, command and result regardless of batch size:
//!
//! - [`splitter`] turns byte or character chunks into non-empty lines,
//!   reassembling lines that straddle chunk boundaries.
//! - [`decoder`] maps lines to commands and classifies malformed input.
//! - [`processor`] executes commands, applies the [`FailurePolicy`] and
//!   [`BatchRule`], and notifies the [`Observer`].
//! - [`encoder`] renders commands or results as NDJSON.
//!
//! [`BulkApi`] wires the stages together for each input shape.
//!
//! # Example
//!
//! ```
//! use bulk_api::{AutomaticReportExecutor, BulkApi, FailurePolicy, ProcessorOptions};
//!
//! let options = ProcessorOptions::default().with_failure_policy(FailurePolicy::BestEffort);
//! let api = BulkApi::new(&AutomaticReportExecutor).with_options(options);
//!
//! let mut output = Vec::new();
//! for line in api.run_byte_stream("[\"config\",{}]\n".as_bytes()) {
//!     output.extend(line?);
//! }
//! assert_eq!(output, b"{\"id\":0,\"status\":\"success\",\"data\":{\"configured\":true}}\n");
//! # Ok::<(), bulk_api::BulkError>(())
//! ```

pub mod decoder;
pub mod encoder;
mod entry;
pub mod error;
pub mod executor;
pub mod model;
pub mod observer;
pub mod processor;
pub mod splitter;

#[cfg(test)]
mod tests;

pub use self::decoder::{decode_byte_stream, decode_line, decode_string, is_blank_line};
pub use self::encoder::{LineWriter, encode_line, to_stream, to_string};
pub use self::entry::BulkApi;
pub use self::error::BulkError;
pub use self::executor::{
    AutomaticReportExecutor, Executor, ExecutorError, ExecutorRegistry, REPORT_EXECUTOR,
};
pub use self::model::{
    Body, Command, CommandKind, CommandResult, Configuration, CorrelationId, ErrorDetail,
    Operation, Resource, ResultStatus,
};
pub use self::observer::{BatchSummary, NoopObserver, Observer, ObserverError, TracingObserver};
pub use self::processor::{BatchRule, CommandProcessor, FailurePolicy, ProcessorOptions};
