//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use kotoba::{cli::Cli, config::SystemEnv, diagnostics, runner};
use std::io;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match runner::run(&cli, &SystemEnv, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("kotoba failed: {}", diagnostics::render(&err));
            ExitCode::FAILURE
        }
    }
}
