//! Command-line runtime for the NDJSON bulk pipeline.
//!
//! The runtime parses arguments, loads layered settings, installs telemetry,
//! resolves the requested executor and streams the request body through
//! [`bulk_api::BulkApi`].
//! Result lines are written to standard output as they are produced. When a
//! batch aborts, the error is written as one final NDJSON error-detail line
//! and the process exits with the error's exit status. IO handles and the
//! configuration loader are passed in so tests can substitute them.

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Write};
use std::process::ExitCode;

use bulk_api::{BulkApi, ExecutorRegistry, LineWriter, TracingObserver};
use clap::Parser;
use tracing::{error, info, warn};

mod cli;
mod config;
mod errors;
mod logging;
mod settings;
mod telemetry;


use cli::Cli;
use config::{Config, ConfigLoader, InputSource, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;

pub use logging::LogFormat;

/// Tracing target for CLI runtime events.
const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Runs the CLI with the provided arguments and IO handles.
///
/// `stdin` is only read when no input file is given.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(split.cli_arguments) {
        Ok(cli) => cli,
        Err(usage) if !usage.use_stderr() => {
            // Help and version output.
            return match write!(stdout, "{usage}") {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(usage) => return fail(stderr, &AppError::CliUsage(usage)),
    };

    let outcome = loader
        .load(&split.config_arguments)
        .and_then(|settings| Config::from_parts(cli, settings))
        .and_then(|config| execute(&config, stdin, stdout));
    match outcome {
        Ok(lines) => {
            info!(target: CLI_TARGET, lines, "batch complete");
            ExitCode::SUCCESS
        }
        Err(failure) => fail(stderr, &failure),
    }
}

fn execute<R: Read, W: Write>(config: &Config, stdin: R, stdout: &mut W) -> Result<usize, AppError> {
    telemetry::initialise(config)?;

    let registry = ExecutorRegistry::with_defaults();
    let api = BulkApi::from_registry(&registry, &config.executor)?
        .with_observer(&TracingObserver)
        .with_options(config.options)
        .with_chunk_size(config.chunk_size);

    let input: Box<dyn Read + '_> = match &config.input {
        InputSource::Stdin => Box::new(stdin),
        InputSource::File(path) => {
            Box::new(File::open(path).map_err(|source| AppError::OpenInput {
                path: path.clone(),
                source,
            })?)
        }
    };
    info!(
        target: CLI_TARGET,
        executor = config.executor.as_str(),
        chunk_size = config.chunk_size,
        "processing batch"
    );

    let mut writer = LineWriter::new(stdout);
    for line in api.run_byte_stream(input) {
        match line {
            Ok(encoded) => writer.write_encoded(&encoded)?,
            Err(abort) => {
                writer.write_item(&abort.detail())?;
                writer.flush()?;
                return Err(AppError::Pipeline(abort));
            }
        }
    }
    writer.flush()?;
    Ok(writer.lines())
}

fn fail<E: Write>(stderr: &mut E, failure: &AppError) -> ExitCode {
    error!(target: CLI_TARGET, %failure, "bulk run failed");
    if let Err(write_error) = writeln!(stderr, "bulk: {failure}") {
        warn!(target: CLI_TARGET, %write_error, "failed to report error");
    }
    ExitCode::from(failure.exit_status())
}
