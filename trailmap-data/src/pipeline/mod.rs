//! Per-layer orchestration: fetch, convert, filter, localise media, write.
//!
//! Download, conversion and write failures are fatal and stop the run.
//! Invalid features and failed media downloads are counted in the
//! [`LayerReport`] instead.
#![forbid(unsafe_code)]

mod error;
mod report;
mod run_log;

pub use error::{LayerJobError, PipelineError, RunLogError};
pub use report::{LayerReport, RunReport};
pub use run_log::RunLog;

use std::collections::BTreeMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use trailmap_core::{DatasetId, LayerName, filter_features};

use crate::convert::{Converter, convert_dataset};
use crate::media::{MediaCache, MediaFetcher, MediaSettings, MediaTransport};
use crate::source::{DatasetSource, fetch_dataset};
use crate::writer::CollectionWriter;

/// Scratch directory name used when none is configured.
pub const DEFAULT_SCRATCH_DIR: &str = ".scratch";

/// One logical layer to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerJob {
    /// Layer name.
    pub layer: LayerName,
    /// Dataset backing the layer.
    pub dataset: DatasetId,
}

impl LayerJob {
    /// Create a job.
    #[must_use]
    pub const fn new(layer: LayerName, dataset: DatasetId) -> Self {
        Self { layer, dataset }
    }
}

impl FromStr for LayerJob {
    type Err = LayerJobError;

    /// Parse `Name=datasetId`, trimming whitespace around both parts.
    ///
    /// # Examples
    /// ```
    /// use trailmap_data::pipeline::LayerJob;
    ///
    /// let job: LayerJob = "Hiking Trails = 1AbC".parse().expect("valid job");
    /// assert_eq!(job.layer.as_str(), "Hiking Trails");
    /// assert_eq!(job.dataset.as_str(), "1AbC");
    /// ```
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, dataset) = value
            .split_once('=')
            .ok_or_else(|| LayerJobError::MissingSeparator(value.to_owned()))?;
        Ok(Self::new(
            LayerName::new(name.trim())?,
            DatasetId::new(dataset.trim())?,
        ))
    }
}

/// Filesystem locations and media options for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Directory receiving layer files and media.
    pub output_dir: Utf8PathBuf,
    /// Directory receiving raw payloads.
    pub scratch_dir: Utf8PathBuf,
    /// Media localisation options.
    pub media: MediaSettings,
}

impl PipelineSettings {
    /// Write beneath `output_dir`, keeping raw payloads in its `.scratch` subdirectory.
    #[must_use]
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            scratch_dir: output_dir.join(DEFAULT_SCRATCH_DIR),
            output_dir,
            media: MediaSettings::default(),
        }
    }

    /// Keep raw payloads in `scratch_dir`.
    #[must_use]
    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<Utf8PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    /// Replace the media options.
    #[must_use]
    pub fn with_media(mut self, media: MediaSettings) -> Self {
        self.media = media;
        self
    }

    /// Scratch file for the raw payload of `job`.
    #[must_use]
    pub fn scratch_path(&self, job: &LayerJob) -> Utf8PathBuf {
        self.scratch_dir
            .join(format!("{}_{}.kml", job.layer.file_stem(), job.dataset))
    }
}

/// Runs layer jobs against injected source, converter and media transport.
///
/// # Examples
/// ```
/// # use camino::Utf8PathBuf;
/// # use serde_json::json;
/// # use trailmap_data::pipeline::{LayerJob, Pipeline, PipelineSettings};
/// # use trailmap_data::test_support::{
/// #     StubConverter, StubDatasetSource, StubMediaTransport, block_on_for_tests,
/// #     feature_collection, point_feature, sample_kml,
/// # };
/// let dir = tempfile::tempdir().expect("create temp directory");
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
/// let source = StubDatasetSource::with_payload(sample_kml());
/// let converter = StubConverter::with_output(feature_collection(&[
///     point_feature(-9.142, 38.736, &json!({"name": "Lisbon"})),
///     point_feature(200.0, 38.736, &json!({"name": "Nowhere"})),
/// ]));
/// let media = StubMediaTransport::new();
/// let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));
/// let job: LayerJob = "Cities=abc".parse().expect("valid job");
/// let report = block_on_for_tests(pipeline.run_layer(&job)).expect("layer runs");
/// assert_eq!(report.valid_features, 1);
/// assert_eq!(report.rejected_features(), 1);
/// assert_eq!(report.output_path, root.join("cities.geojson"));
/// ```
#[derive(Debug)]
pub struct Pipeline<'a, S: ?Sized, C: ?Sized, M: ?Sized> {
    source: &'a S,
    converter: &'a C,
    media: &'a M,
    settings: PipelineSettings,
    run_log: Option<&'a RunLog>,
}

impl<'a, S, C, M> Pipeline<'a, S, C, M>
where
    S: DatasetSource + ?Sized,
    C: Converter + ?Sized,
    M: MediaTransport + ?Sized,
{
    /// Create a pipeline from its collaborators.
    #[must_use]
    pub const fn new(
        source: &'a S,
        converter: &'a C,
        media: &'a M,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            converter,
            media,
            settings,
            run_log: None,
        }
    }

    /// Record each completed layer in `run_log`.
    #[must_use]
    pub const fn with_run_log(mut self, run_log: &'a RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Process one layer end to end.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the download, conversion, write or run
    /// log step fails. The raw payload stays in the scratch directory once it
    /// has been downloaded, even if it is not KML. Download and conversion
    /// failures leave the layer file untouched. A run log failure is reported
    /// after the layer file and its media have been written.
    pub async fn run_layer(&self, job: &LayerJob) -> Result<LayerReport, PipelineError> {
        let layer = &job.layer;
        info!("processing layer {layer} from dataset {}", job.dataset);

        let scratch_path = self.settings.scratch_path(job);
        let raw = fetch_dataset(self.source, &job.dataset, &scratch_path)
            .await
            .map_err(|source| PipelineError::Download {
                layer: layer.clone(),
                source,
            })?;

        let features = convert_dataset(self.converter, &raw)
            .await
            .map_err(|source| PipelineError::Conversion {
                layer: layer.clone(),
                source,
            })?;

        let filtered = filter_features(features);
        info!(
            "layer {layer}: {} of {} features valid",
            filtered.valid_count(),
            filtered.total
        );
        let total_features = filtered.total;
        let mut valid = filtered.valid;

        let cache = MediaCache::new();
        let media = MediaFetcher::new(
            self.media,
            &cache,
            &self.settings.media,
            &self.settings.output_dir,
        )
        .localize(layer, &mut valid)
        .await;
        if media.referenced > 0 {
            info!("layer {layer} media: {media}");
        }

        let output_path = CollectionWriter::new(&self.settings.output_dir)
            .write(layer, &job.dataset, &valid)
            .map_err(|source| PipelineError::Write {
                layer: layer.clone(),
                source,
            })?;

        let report = LayerReport {
            layer: layer.clone(),
            dataset: job.dataset.clone(),
            output_path,
            raw_path: raw.scratch_path,
            total_features,
            valid_features: valid.len(),
            media,
        };
        if let Some(run_log) = self.run_log {
            run_log.record(&report)?;
        }
        Ok(report)
    }

    /// Process `jobs` in order, stopping at the first fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateLayer`] before any work starts when
    /// two jobs share a file stem, otherwise the first fatal layer error.
    pub async fn run_layers(&self, jobs: &[LayerJob]) -> Result<RunReport, PipelineError> {
        ensure_unique_stems(jobs)?;
        let mut report = RunReport::default();
        for job in jobs {
            report.layers.push(self.run_layer(job).await?);
        }
        Ok(report)
    }

    /// Output directory for layer files and media.
    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        &self.settings.output_dir
    }
}

fn ensure_unique_stems(jobs: &[LayerJob]) -> Result<(), PipelineError> {
    let mut seen: BTreeMap<String, &LayerName> = BTreeMap::new();
    for job in jobs {
        let stem = job.layer.file_stem();
        if let Some(first) = seen.get(&stem) {
            return Err(PipelineError::DuplicateLayer {
                first: (*first).clone(),
                second: job.layer.clone(),
                stem,
            });
        }
        seen.insert(stem, &job.layer);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
