//! Command-line interface for the Trailmap ingestion pipeline.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod ingest;

pub use error::CliError;

use ingest::{IngestArgs, run_ingest};

/// Run the Trailmap CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, or when
/// a layer fails to ingest.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Ingest(args) => run_ingest(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "trailmap",
    about = "Ingest published map datasets into tiling-ready layer files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download, validate and write one file per layer.
    Ingest(IngestArgs),
}

#[cfg(test)]
mod tests;
