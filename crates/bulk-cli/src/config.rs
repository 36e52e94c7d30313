//! Configuration loading for the `bulk` binary.
//!
//! Configuration flags are routed to `ortho_config` so they layer over
//! environment variables and configuration files. The remaining arguments
//! (the input path, `--help` and `--version`) go to the clap parser.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use bulk_api::ProcessorOptions;
use ortho_config::OrthoConfig;

use crate::AppError;
use crate::cli::Cli;
use crate::logging::LogFormat;
use crate::settings::Settings;

/// Path argument that selects standard input.
const STDIN_MARKER: &str = "-";

/// Flags recognised by the configuration loader and whether each takes a
/// value.
///
/// Keep in sync with the fields of [`Settings`].
const CONFIG_CLI_FLAGS: &[(&str, bool)] = &[
    ("--config-path", true),
    ("--failure-policy", true),
    ("--batch-rule", true),
    ("--chunk-size", true),
    ("--executor", true),
    ("--log-filter", true),
    ("--log-format", true),
];

pub(crate) trait ConfigLoader {
    /// Loads settings from the configuration arguments split off the command
    /// line, layered over the environment and configuration files.
    fn load(&self, args: &[OsString]) -> Result<Settings, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Settings, AppError> {
        Settings::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };

    CONFIG_CLI_FLAGS
        .iter()
        .find(|(name, _)| *name == flag)
        .map_or(FlagAction::Skip, |&(_, takes_value)| FlagAction::Include {
            needs_value: takes_value && !has_inline_value,
        })
}

/// Command-line arguments partitioned between the loader and clap.
///
/// Both halves keep the program name as their first element.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

/// Moves configuration flags (and their values) out of `args`.
///
/// Flags may appear anywhere before a `--` separator; everything after it is
/// left for clap.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut split = ConfigArgumentSplit::default();
    let mut remaining = args.iter();
    if let Some(program) = remaining.next() {
        split.config_arguments.push(program.clone());
        split.cli_arguments.push(program.clone());
    }

    while let Some(argument) = remaining.next() {
        if argument == "--" {
            split.cli_arguments.push(argument.clone());
            split.cli_arguments.extend(remaining.cloned());
            break;
        }
        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                split.config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    split.config_arguments.push(value.clone());
                }
            }
            FlagAction::Skip => split.cli_arguments.push(argument.clone()),
        }
    }
    split
}

/// Where the request body is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Validated configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) input: InputSource,
    pub(crate) options: ProcessorOptions,
    pub(crate) chunk_size: usize,
    pub(crate) executor: String,
    pub(crate) log_filter: String,
    pub(crate) log_format: LogFormat,
}

impl Config {
    /// Combines parsed arguments with loaded settings, validating both.
    pub(crate) fn from_parts(cli: Cli, settings: Settings) -> Result<Self, AppError> {
        if settings.chunk_size == 0 {
            return Err(AppError::InvalidChunkSize);
        }
        if settings.executor.trim().is_empty() {
            return Err(AppError::MissingExecutor);
        }

        let input = match cli.input {
            Some(path) if path.as_os_str() != OsStr::new(STDIN_MARKER) => {
                InputSource::File(path)
            }
            Some(_) | None => InputSource::Stdin,
        };
        let options = ProcessorOptions::default()
            .with_failure_policy(settings.failure_policy.into())
            .with_batch_rule(settings.batch_rule.into());

        Ok(Self {
            input,
            options,
            chunk_size: settings.chunk_size,
            executor: settings.executor,
            log_filter: settings.log_filter,
            log_format: settings.log_format,
        })
    }

    pub(crate) fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub(crate) const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
