use std::io;

use thiserror::Error;

/// Errors produced while converting a raw payload. All variants abort the layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// The conversion tool could not be started.
    #[error("failed to launch converter {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The conversion tool exited unsuccessfully.
    #[error("converter {program} exited with {status}: {stderr}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The conversion tool did not finish in time.
    #[error("converter {program} did not finish within {timeout_secs}s")]
    TimedOut {
        /// Program that timed out.
        program: String,
        /// Time limit applied.
        timeout_secs: u64,
    },
    /// The conversion tool exited successfully but wrote nothing.
    #[error("converter {program} produced no output")]
    NoOutput {
        /// Program that produced no output.
        program: String,
    },
    /// The output was not valid JSON of the expected shape.
    #[error("failed to parse converter output: {source}")]
    Parse {
        /// Underlying decode failure.
        source: simd_json::Error,
    },
    /// The output parsed but was not a feature collection.
    #[error("converter output was a {found}, expected a FeatureCollection")]
    NotFeatureCollection {
        /// Document type that was found instead.
        found: String,
    },
}
