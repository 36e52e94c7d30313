//! Observer capability: lifecycle notifications for telemetry.
//!
//! Observers are told when a command starts, when it completes, and when the
//! batch ends. Their failures are isolated by the processor: an error is
//! logged and the batch carries on unchanged.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Command, CommandResult};

/// Tracing target for lifecycle events emitted by [`TracingObserver`].
pub(crate) const OBSERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::observer");

/// Failure reported by an observer hook.
#[derive(Debug, Error)]
#[error("observer failed: {message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Creates an observer error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Commands handed to the executor.
    pub processed: usize,
    /// Commands the executor accepted.
    pub succeeded: usize,
    /// Commands the executor rejected.
    pub failed: usize,
    /// Whether the run ended on an error rather than at the end of input.
    pub aborted: bool,
}

/// Receives lifecycle notifications from the processor.
///
/// Every hook defaults to a no-op, so implementations only override the
/// events they care about.
pub trait Observer {
    /// Called before a command is handed to the executor.
    ///
    /// # Errors
    ///
    /// Returns an [`ObserverError`]; the processor logs it and continues.
    fn command_started(&self, _command: &Command) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called after a command produced a result record.
    ///
    /// # Errors
    ///
    /// Returns an [`ObserverError`]; the processor logs it and continues.
    fn command_completed(&self, _result: &CommandResult) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called exactly once when the run ends, whether or not it aborted.
    ///
    /// # Errors
    ///
    /// Returns an [`ObserverError`]; the processor logs it and continues.
    fn batch_completed(&self, _summary: &BatchSummary) -> Result<(), ObserverError> {
        Ok(())
    }
}

impl<O: Observer + ?Sized> Observer for &O {
    fn command_started(&self, command: &Command) -> Result<(), ObserverError> {
        (**self).command_started(command)
    }

    fn command_completed(&self, result: &CommandResult) -> Result<(), ObserverError> {
        (**self).command_completed(result)
    }

    fn batch_completed(&self, summary: &BatchSummary) -> Result<(), ObserverError> {
        (**self).batch_completed(summary)
    }
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn command_started(&self, command: &Command) -> Result<(), ObserverError> {
        (**self).command_started(command)
    }

    fn command_completed(&self, result: &CommandResult) -> Result<(), ObserverError> {
        (**self).command_completed(result)
    }

    fn batch_completed(&self, summary: &BatchSummary) -> Result<(), ObserverError> {
        (**self).batch_completed(summary)
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Observer that records lifecycle events as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn command_started(&self, command: &Command) -> Result<(), ObserverError> {
        debug!(
            target: OBSERVER_TARGET,
            id = command.id().position(),
            kind = command.kind().tag(),
            "command started"
        );
        Ok(())
    }

    fn command_completed(&self, result: &CommandResult) -> Result<(), ObserverError> {
        debug!(
            target: OBSERVER_TARGET,
            id = result.id().position(),
            success = result.is_success(),
            "command completed"
        );
        Ok(())
    }

    fn batch_completed(&self, summary: &BatchSummary) -> Result<(), ObserverError> {
        info!(
            target: OBSERVER_TARGET,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            aborted = summary.aborted,
            "batch completed"
        );
        Ok(())
    }
}
