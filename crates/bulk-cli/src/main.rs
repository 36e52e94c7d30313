//! CLI entrypoint for the `bulk` NDJSON pipeline.
//!
//! The binary delegates to [`bulk_cli::run`] with the process arguments and
//! locked standard streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    bulk_cli::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
