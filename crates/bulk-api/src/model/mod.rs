//! Typed command and result records exchanged by the pipeline.
//!
//! A [`Command`] is built once per input line and never mutated afterwards.
//! It keeps the decoded JSON value verbatim (`raw`) next to the typed
//! [`Operation`] so the encoder can echo exactly what the client sent.
//! A [`CommandResult`] is the outcome record for one executed command.

mod command;
mod result;

pub use self::command::{
    ANCHOR_KEY, Body, Command, CommandKind, Configuration, CorrelationId, Operation,
    RELATIONSHIPS_KEY, Resource, TOTAL_INSTRUCTIONS_KEY,
};
pub use self::result::{CommandResult, ErrorDetail, ResultStatus};

#[cfg(test)]
mod tests;
