//! Ordered, pull-based command processing.
//!
//! [`CommandProcessor::process`] wraps a lazy sequence of decoded commands in
//! [`ProcessedCommands`], which executes one command per pull and yields its
//! result record. Nothing is buffered: when the consumer stops pulling, no
//! further commands are decoded or executed.
//!
//! The run ends at the first error item unless the error is an executor
//! rejection under [`FailurePolicy::BestEffort`], which becomes an error
//! record instead.

use tracing::{debug, warn};

use crate::error::BulkError;
use crate::executor::Executor;
use crate::model::{Command, CommandResult};
use crate::observer::{BatchSummary, Observer, ObserverError};

/// Tracing target for processor events.
pub(crate) const PROCESSOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::processor");

/// How the processor reacts when the executor rejects a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run; no further commands are executed.
    #[default]
    FailFast,
    /// Record an error result and continue with the next command.
    BestEffort,
}

/// Batch-level ordering rule checked before each command executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchRule {
    /// The batch must open with exactly one `config` command.
    #[default]
    ConfigurationFirst,
    /// No ordering constraints.
    Unconstrained,
}

/// Options controlling one processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Reaction to executor rejections.
    pub failure_policy: FailurePolicy,
    /// Ordering rule for the configuration command.
    pub batch_rule: BatchRule,
}

impl ProcessorOptions {
    /// Returns the options with the given failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Returns the options with the given batch rule.
    #[must_use]
    pub const fn with_batch_rule(mut self, batch_rule: BatchRule) -> Self {
        self.batch_rule = batch_rule;
        self
    }
}

/// Executes commands against an executor, in order, one at a time.
///
/// The processor only borrows its executor and observer; both stay owned by
/// the caller.
pub struct CommandProcessor<'a, E: ?Sized, O: ?Sized> {
    executor: &'a E,
    observer: &'a O,
    options: ProcessorOptions,
}

impl<'a, E, O> CommandProcessor<'a, E, O>
where
    E: Executor + ?Sized,
    O: Observer + ?Sized,
{
    /// Creates a processor bound to an executor and an observer.
    #[must_use]
    pub const fn new(executor: &'a E, observer: &'a O, options: ProcessorOptions) -> Self {
        Self {
            executor,
            observer,
            options,
        }
    }

    /// Returns the options of this processor.
    #[must_use]
    pub const fn options(&self) -> ProcessorOptions {
        self.options
    }

    /// Starts a run over a lazy sequence of decoded commands.
    ///
    /// Nothing executes until the returned sequence is pulled.
    pub fn process<I>(self, commands: I) -> ProcessedCommands<'a, I::IntoIter, E, O>
    where
        I: IntoIterator<Item = Result<Command, BulkError>>,
    {
        ProcessedCommands {
            commands: commands.into_iter(),
            executor: self.executor,
            observer: self.observer,
            options: self.options,
            seen: 0,
            instructions: 0,
            expected_instructions: None,
            summary: BatchSummary::default(),
            finished: false,
        }
    }
}

/// Lazy sequence of result records for one run.
///
/// Yields `Ok` records until the input ends, or a single `Err` that ends the
/// run. The executor's `finish` hook and the observer's `batch_completed` hook
/// fire when the run ends.
pub struct ProcessedCommands<'a, I, E: ?Sized, O: ?Sized> {
    commands: I,
    executor: &'a E,
    observer: &'a O,
    options: ProcessorOptions,
    seen: usize,
    instructions: u64,
    expected_instructions: Option<u64>,
    summary: BatchSummary,
    finished: bool,
}

impl<I, E, O> ProcessedCommands<'_, I, E, O>
where
    E: Executor + ?Sized,
    O: Observer + ?Sized,
{
    /// Returns the counters accumulated so far.
    #[must_use]
    pub const fn summary(&self) -> BatchSummary {
        self.summary
    }

    fn step(&mut self, command: &Command) -> Result<CommandResult, BulkError> {
        self.check_structure(command)?;
        self.notify("command_started", self.observer.command_started(command));

        debug!(
            target: PROCESSOR_TARGET,
            id = command.id().position(),
            kind = command.kind().tag(),
            "executing command"
        );
        self.summary.processed += 1;
        let result = match self.executor.execute(command) {
            Ok(data) => {
                self.summary.succeeded += 1;
                CommandResult::success(command, data)
            }
            Err(source) => {
                self.summary.failed += 1;
                let error = BulkError::execution(command.id(), source);
                match self.options.failure_policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::BestEffort => {
                        warn!(target: PROCESSOR_TARGET, %error, "command failed; continuing batch");
                        CommandResult::failure(command, &error.detail())
                    }
                }
            }
        };

        self.notify("command_completed", self.observer.command_completed(&result));
        Ok(result)
    }

    fn check_structure(&mut self, command: &Command) -> Result<(), BulkError> {
        let index = self.seen;
        self.seen += 1;
        let configuration = command.operation().configuration();
        if configuration.is_none() {
            self.instructions += 1;
        }

        if self.options.batch_rule == BatchRule::ConfigurationFirst {
            match (index, configuration) {
                (0, None) => {
                    return Err(BulkError::batch_structure(format!(
                        "the batch must start with a 'config' command, found '{}'",
                        command.kind()
                    )));
                }
                (0, Some(_)) | (_, None) => {}
                (_, Some(_)) => {
                    return Err(BulkError::batch_structure(format!(
                        "'config' must appear exactly once, found a second one at position {}",
                        command.id().position()
                    )));
                }
            }
        }

        if let Some(configuration) = configuration {
            self.expected_instructions = configuration.total_instructions();
        }
        Ok(())
    }

    fn verify_totals(&self) -> Result<(), BulkError> {
        if self.seen == 0 && self.options.batch_rule == BatchRule::ConfigurationFirst {
            return Err(BulkError::batch_structure(
                "the batch is empty; a leading 'config' command is required",
            ));
        }
        match self.expected_instructions {
            Some(expected) if expected != self.instructions => {
                Err(BulkError::batch_structure(format!(
                    "configuration declared {expected} instructions but the batch contained {}",
                    self.instructions
                )))
            }
            _ => Ok(()),
        }
    }

    fn complete(&mut self) -> Result<(), BulkError> {
        self.finished = true;
        let outcome = self
            .verify_totals()
            .and_then(|()| self.executor.finish().map_err(BulkError::finalize));
        self.summary.aborted = outcome.is_err();

        match &outcome {
            Ok(()) => debug!(
                target: PROCESSOR_TARGET,
                processed = self.summary.processed,
                "batch finished"
            ),
            Err(error) => warn!(target: PROCESSOR_TARGET, %error, "batch failed at completion"),
        }
        self.notify("batch_completed", self.observer.batch_completed(&self.summary));
        outcome
    }

    fn abort(&mut self, error: BulkError) -> BulkError {
        self.finished = true;
        self.summary.aborted = true;
        warn!(
            target: PROCESSOR_TARGET,
            kind = error.kind(),
            %error,
            "batch aborted"
        );
        self.notify("batch_completed", self.observer.batch_completed(&self.summary));
        error
    }

    fn notify(&self, hook: &'static str, outcome: Result<(), ObserverError>) {
        if let Err(error) = outcome {
            warn!(target: PROCESSOR_TARGET, hook, %error, "observer hook failed; ignoring");
        }
    }
}

impl<I, E, O> Iterator for ProcessedCommands<'_, I, E, O>
where
    I: Iterator<Item = Result<Command, BulkError>>,
    E: Executor + ?Sized,
    O: Observer + ?Sized,
{
    type Item = Result<CommandResult, BulkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let outcome = match self.commands.next() {
            Some(Ok(command)) => self.step(&command),
            Some(Err(error)) => Err(error),
            None => return self.complete().err().map(Err),
        };
        Some(outcome.map_err(|error| self.abort(error)))
    }
}
