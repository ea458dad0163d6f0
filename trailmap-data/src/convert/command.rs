//! [`Converter`] backed by an external command-line tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use super::{ConversionError, Converter};
use crate::source::RawDataset;

/// GDAL's vector translator, the default conversion tool.
pub const DEFAULT_CONVERTER_PROGRAM: &str = "ogr2ogr";

/// Argument placeholder replaced by the scratch path of the raw payload.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Default time limit for a single conversion.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Runs an external program that writes the interchange document to stdout.
///
/// The default invocation is `ogr2ogr -f GeoJSON /vsistdout/ {input}`.
///
/// # Examples
/// ```
/// use trailmap_data::convert::{CommandConverter, Converter};
///
/// let converter = CommandConverter::default();
/// assert_eq!(converter.name(), "ogr2ogr");
/// assert_eq!(converter.args_for("trails.kml"), ["-f", "GeoJSON", "/vsistdout/", "trails.kml"]);
/// ```
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self {
            program: DEFAULT_CONVERTER_PROGRAM.to_owned(),
            args: ["-f", "GeoJSON", "/vsistdout/", INPUT_PLACEHOLDER]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CommandConverter {
    /// Use `program` with the default argument template.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Replace the argument template. Occurrences of [`INPUT_PLACEHOLDER`]
    /// are substituted with the input path.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the time limit for a single conversion.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the program for `input`.
    #[must_use]
    pub fn args_for(&self, input: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, input))
            .collect()
    }
}

#[async_trait(?Send)]
impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, raw: &RawDataset) -> Result<Vec<u8>, ConversionError> {
        let args = self.args_for(raw.scratch_path.as_str());
        debug!("running {} {}", self.program, args.join(" "));
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ConversionError::TimedOut {
                program: self.program.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ConversionError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(output.stdout)
    }
}
