//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bulk_api::BulkError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Exit status for usage and infrastructure failures.
const USAGE_EXIT_STATUS: u8 = 2;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("--chunk-size must be at least 1")]
    InvalidChunkSize,
    #[error("--executor must name a registered executor")]
    MissingExecutor,
    #[error("failed to open input {path}: {source}", path = .path.display())]
    OpenInput { path: PathBuf, source: io::Error },
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Pipeline(#[from] BulkError),
}

impl AppError {
    /// Returns the process exit status for this error.
    pub(crate) const fn exit_status(&self) -> u8 {
        match self {
            Self::Pipeline(error) => error.exit_status(),
            Self::LoadConfiguration(_)
            | Self::CliUsage(_)
            | Self::InvalidChunkSize
            | Self::MissingExecutor
            | Self::OpenInput { .. }
            | Self::Telemetry(_) => USAGE_EXIT_STATUS,
        }
    }
}
