//! stagegate CLI entry point.
//!
//! Initializes logging and delegates to the CLI module for command handling.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = stagegate::cli::parse_cli();

    // RUST_LOG takes priority over --log-level.
    stagegate::observability::init_tracing(&cli.log_level, cli.log_format);

    stagegate::cli::run_with_cli(cli).await
}
