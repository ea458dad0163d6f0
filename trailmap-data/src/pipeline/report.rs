use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use trailmap_core::{DatasetId, LayerName};

use super::PipelineError;
use crate::media::MediaReport;

/// Summary of one successfully processed layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerReport {
    /// Layer name.
    pub layer: LayerName,
    /// Source dataset.
    pub dataset: DatasetId,
    /// Written layer file.
    pub output_path: Utf8PathBuf,
    /// Persisted raw payload.
    pub raw_path: Utf8PathBuf,
    /// Features produced by the converter.
    pub total_features: usize,
    /// Features that passed validation and were written.
    pub valid_features: usize,
    /// Media pass counters.
    pub media: MediaReport,
}

impl LayerReport {
    /// Features dropped by validation.
    #[must_use]
    pub const fn rejected_features(&self) -> usize {
        self.total_features.saturating_sub(self.valid_features)
    }
}

impl fmt::Display for LayerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} of {} features valid, {} rejected; media: {}; wrote {}",
            self.layer,
            self.dataset,
            self.valid_features,
            self.total_features,
            self.rejected_features(),
            self.media,
            self.output_path
        )
    }
}

/// Summary of a multi-layer run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Per-layer reports in job order.
    pub layers: Vec<LayerReport>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    name: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct Manifest<'a> {
    layers: Vec<ManifestEntry<'a>>,
}

impl RunReport {
    /// `(layer, file)` pairs handed to the tiling step.
    #[must_use]
    pub fn tiling_inputs(&self) -> Vec<(LayerName, Utf8PathBuf)> {
        self.layers
            .iter()
            .map(|report| (report.layer.clone(), report.output_path.clone()))
            .collect()
    }

    /// Render the tiling manifest as pretty JSON ending in a newline.
    ///
    /// Each entry's `name` is the file stem, which becomes the tiled layer name.
    #[must_use]
    pub fn render_manifest(&self) -> Vec<u8> {
        let manifest = Manifest {
            layers: self
                .layers
                .iter()
                .map(|report| ManifestEntry {
                    name: report.output_path.file_stem().unwrap_or_default(),
                    path: report.output_path.as_str(),
                })
                .collect(),
        };
        // Serialising plain string fields cannot fail.
        let mut bytes = serde_json::to_vec_pretty(&manifest).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Atomically write the tiling manifest to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Manifest`] when the file cannot be written.
    pub fn write_manifest(&self, path: &Utf8Path) -> Result<(), PipelineError> {
        trailmap_fs::write_atomically(path, &self.render_manifest()).map_err(|source| {
            PipelineError::Manifest {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
