//! Command-line argument definitions for the `bulk` binary.

use std::path::PathBuf;

use clap::Parser;

/// Help text for the flags handled by the configuration loader.
const CONFIGURATION_HELP: &str = "\
Configuration (flag, BULK_* environment variable or TOML file):
      --config-path <PATH>          Configuration file [env: BULK_CONFIG_PATH]
      --failure-policy <POLICY>     fail-fast | best-effort [default: fail-fast]
      --batch-rule <RULE>           configuration-first | unconstrained [default: configuration-first]
      --chunk-size <BYTES>          Bytes read from the input at a time [default: 8192]
      --executor <NAME>             Registered executor [default: report]
      --log-filter <FILTER>         Tracing filter directive [default: info]
      --log-format <FORMAT>         json | compact [default: compact]";

/// Streams an NDJSON bulk request through the command pipeline.
#[derive(Parser, Debug)]
#[command(name = "bulk", version, about, after_help = CONFIGURATION_HELP)]
pub(crate) struct Cli {
    /// NDJSON request file; reads standard input when absent or `-`.
    #[arg(value_name = "INPUT")]
    pub(crate) input: Option<PathBuf>,
}
