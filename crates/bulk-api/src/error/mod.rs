//! Error taxonomy for the bulk pipeline.
//!
//! Every stage reports failures through [`BulkError`]. Decode-time variants
//! carry the 0-based batch position of the offending line so callers can point
//! at the exact input; execution variants carry the correlation id of the
//! command the executor rejected. I/O errors are wrapped in `Arc` to satisfy
//! the `result_large_err` Clippy lint.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::model::{CorrelationId, ErrorDetail};

/// Maximum number of characters of an offending line kept inside an error.
const LINE_EXCERPT_LIMIT: usize = 256;

/// Errors surfaced while decoding, processing, or encoding a batch.
#[derive(Debug, Error)]
pub enum BulkError {
    /// A line could not be parsed as a JSON value.
    #[error("malformed JSON on line {position}: {message}")]
    MalformedJson {
        /// 0-based position of the line among the non-empty lines of the batch.
        position: usize,
        /// Excerpt of the offending line, lossily decoded as UTF-8.
        line: String,
        /// Parser diagnostic.
        message: String,
        /// Underlying parser error, when one exists.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A line parsed as JSON but does not have a recognised command shape.
    #[error("malformed command on line {position}: {message}")]
    MalformedCommand {
        /// 0-based position of the line within the batch.
        position: usize,
        /// Description of the shape violation.
        message: String,
    },

    /// A batch-level ordering or counting rule was violated.
    #[error("invalid batch structure: {message}")]
    BatchStructure {
        /// Description of the violated rule.
        message: String,
    },

    /// The executor rejected a command.
    #[error("command {id} failed: {source}")]
    Execution {
        /// Correlation id of the rejected command.
        id: CorrelationId,
        /// Failure reported by the executor.
        #[source]
        source: ExecutorError,
    },

    /// The executor's end-of-batch hook failed.
    #[error("failed to finalise batch: {source}")]
    Finalize {
        /// Failure reported by the executor.
        #[source]
        source: ExecutorError,
    },

    /// A supplied capability does not satisfy the required contract.
    #[error("contract violation: {message}")]
    ContractViolation {
        /// Description of the unmet requirement.
        message: String,
    },

    /// Reading the input or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// A command or result could not be serialised.
    #[error("failed to encode NDJSON line: {0}")]
    Encode(#[source] serde_json::Error),
}

impl BulkError {
    /// Creates a malformed JSON error from a parser failure.
    #[must_use]
    pub fn from_json_error(position: usize, line: &[u8], source: serde_json::Error) -> Self {
        Self::MalformedJson {
            position,
            line: excerpt(line),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed JSON error with a custom message.
    #[must_use]
    pub fn malformed_json(position: usize, line: &[u8], message: impl Into<String>) -> Self {
        Self::MalformedJson {
            position,
            line: excerpt(line),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a malformed command error.
    #[must_use]
    pub fn malformed_command(position: usize, message: impl Into<String>) -> Self {
        Self::MalformedCommand {
            position,
            message: message.into(),
        }
    }

    /// Creates a batch structure error.
    #[must_use]
    pub fn batch_structure(message: impl Into<String>) -> Self {
        Self::BatchStructure {
            message: message.into(),
        }
    }

    /// Creates an execution error for the given command.
    #[must_use]
    pub const fn execution(id: CorrelationId, source: ExecutorError) -> Self {
        Self::Execution { id, source }
    }

    /// Creates a finalisation error.
    #[must_use]
    pub const fn finalize(source: ExecutorError) -> Self {
        Self::Finalize { source }
    }

    /// Creates a contract violation error.
    #[must_use]
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    /// Creates an encoding error.
    #[must_use]
    pub const fn encode(source: serde_json::Error) -> Self {
        Self::Encode(source)
    }

    /// Returns the stable, snake-case name of the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::MalformedCommand { .. } => "malformed_command",
            Self::BatchStructure { .. } => "batch_structure",
            Self::Execution { .. } => "execution",
            Self::Finalize { .. } => "finalize",
            Self::ContractViolation { .. } => "contract_violation",
            Self::Io(_) => "io",
            Self::Encode(_) => "encode",
        }
    }

    /// Returns the batch position the error refers to, when it has one.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::MalformedJson { position, .. } | Self::MalformedCommand { position, .. } => {
                Some(*position)
            }
            Self::Execution { id, .. } => Some(id.position()),
            Self::BatchStructure { .. }
            | Self::Finalize { .. }
            | Self::ContractViolation { .. }
            | Self::Io(_)
            | Self::Encode(_) => None,
        }
    }

    /// Returns `true` for errors raised while decoding the input stream.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson { .. } | Self::MalformedCommand { .. }
        )
    }

    /// Returns the HTTP status a web boundary should answer with when a run
    /// aborts with this error.
    ///
    /// Decode failures are client errors (400), batch structure violations are
    /// unprocessable (422), and a fail-fast execution failure is a conflict
    /// with the backing store (409). Everything else is a server error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MalformedJson { .. } | Self::MalformedCommand { .. } => 400,
            Self::BatchStructure { .. } => 422,
            Self::Execution { .. } => 409,
            Self::Finalize { .. }
            | Self::ContractViolation { .. }
            | Self::Io(_)
            | Self::Encode(_) => 500,
        }
    }

    /// Returns the process exit status for this error.
    ///
    /// Protocol, batch, and execution failures return status 1.
    /// Infrastructure failures (I/O, encoding, contracts) return status 2.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::MalformedJson { .. }
            | Self::MalformedCommand { .. }
            | Self::BatchStructure { .. }
            | Self::Execution { .. }
            | Self::Finalize { .. } => 1,
            Self::ContractViolation { .. } | Self::Io(_) | Self::Encode(_) => 2,
        }
    }

    /// Renders the error as a serialisable detail record.
    #[must_use]
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail::new(self.kind(), self.to_string(), self.position())
    }
}

impl From<io::Error> for BulkError {
    fn from(source: io::Error) -> Self {
        Self::Io(Arc::new(source))
    }
}

fn excerpt(line: &[u8]) -> String {
    String::from_utf8_lossy(line)
        .chars()
        .take(LINE_EXCERPT_LIMIT)
        .collect()
}
