//! Executor capability: the sole mutation boundary of the pipeline.
//!
//! The processor hands every [`Command`] to an [`Executor`] in batch order and
//! turns its answer into a result record. The pipeline only borrows the
//! executor for the duration of a run; the caller owns it and is responsible
//! for its thread-safety if it is shared between runs.

mod registry;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Command, CommandKind, Operation};

pub use self::registry::{ExecutorRegistry, REPORT_EXECUTOR};

/// Errors an executor raises when it cannot carry out a command.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The backing store refused the command (for example a constraint
    /// violation).
    #[error("{kind} rejected: {message}")]
    Rejected {
        /// Kind of the rejected command.
        kind: CommandKind,
        /// Description of the refusal.
        message: String,
    },

    /// The executor does not implement the requested operation.
    #[error("operation '{kind}' is not supported by this executor")]
    Unsupported {
        /// Kind of the unsupported command.
        kind: CommandKind,
    },

    /// The backing store failed independently of the command.
    #[error("backing store failure: {message}")]
    Store {
        /// Description of the failure.
        message: String,
        /// Underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ExecutorError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(kind: CommandKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }

    /// Creates a store error without an underlying source.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }
}

/// Performs the state mutation for each command of a batch.
///
/// Implementations receive commands strictly in batch order, one call per
/// command. A returned payload becomes the `data` of the success record.
///
/// # Example
///
/// ```
/// use bulk_api::{Command, Executor, ExecutorError};
/// use serde_json::{Value, json};
///
/// struct Echo;
///
/// impl Executor for Echo {
///     fn execute(&self, command: &Command) -> Result<Value, ExecutorError> {
///         Ok(json!({"echo": command.raw()}))
///     }
/// }
/// ```
///
/// Conformance is checked by the compiler, so a value that does not implement
/// the capability cannot be handed to the entry point at all:
///
/// ```compile_fail
/// use bulk_api::BulkApi;
///
/// let not_an_executor = "not an executor";
/// let _ = BulkApi::new(&not_an_executor);
/// ```
pub trait Executor {
    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] when the command cannot be carried out.
    fn execute(&self, command: &Command) -> Result<Value, ExecutorError>;

    /// Runs once after the last command of a batch that was not aborted.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] when pending work cannot be flushed.
    fn finish(&self) -> Result<(), ExecutorError> {
        Ok(())
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, command: &Command) -> Result<Value, ExecutorError> {
        (**self).execute(command)
    }

    fn finish(&self) -> Result<(), ExecutorError> {
        (**self).finish()
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, command: &Command) -> Result<Value, ExecutorError> {
        (**self).execute(command)
    }

    fn finish(&self) -> Result<(), ExecutorError> {
        (**self).finish()
    }
}

/// Executor that reports success for every command without touching a store.
///
/// Resource commands are answered with a synthetic identifier derived from the
/// resource type and the command's batch position, so clients can exercise
/// the protocol end to end.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomaticReportExecutor;

impl Executor for AutomaticReportExecutor {
    fn execute(&self, command: &Command) -> Result<Value, ExecutorError> {
        let mut report = Map::new();
        match command.operation() {
            Operation::Configure(_) => {
                report.insert("configured".to_owned(), Value::Bool(true));
            }
            Operation::Create(resource)
            | Operation::Update(resource)
            | Operation::Upsert(resource)
            | Operation::Delete(resource) => {
                let resource_type = resource.resource_type();
                report.insert("type".to_owned(), Value::from(resource_type));
                report.insert(
                    "id".to_owned(),
                    Value::from(format!("{resource_type}_{}", command.id().position())),
                );
            }
        }
        Ok(Value::Object(report))
    }
}
