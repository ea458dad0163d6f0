//! Deterministic serialisation of layer feature collections.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::Serialize;
use thiserror::Error;
use trailmap_core::{DatasetId, Feature, LayerName};

/// Coordinate reference system declared by every layer file.
pub const CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Extension of written layer files.
pub const LAYER_EXTENSION: &str = "geojson";

/// Errors produced while writing a layer. All variants abort the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    /// The collection could not be serialised.
    #[error("failed to serialise layer {layer}: {source}")]
    Serialise {
        /// Layer being written.
        layer: LayerName,
        /// Underlying serialisation failure.
        source: serde_json::Error,
    },
    /// The file could not be written.
    #[error("failed to write layer file {path}: {source}")]
    Write {
        /// Target path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}

#[derive(Serialize)]
struct CrsProperties {
    name: &'static str,
}

#[derive(Serialize)]
struct Crs {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: CrsProperties,
}

#[derive(Serialize)]
struct LayerCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    crs: Crs,
    features: &'a [Feature],
}

/// Display name of a layer collection, e.g. `Trails Layer (abc123)`.
#[must_use]
pub fn collection_name(layer: &LayerName, dataset: &DatasetId) -> String {
    format!("{layer} Layer ({dataset})")
}

/// Serialise a named feature collection as pretty-printed JSON ending in a newline.
///
/// Equal input always produces byte-identical output.
///
/// # Errors
///
/// Returns [`WriteError::Serialise`] if serialisation fails.
pub fn render_collection(
    layer: &LayerName,
    dataset: &DatasetId,
    features: &[Feature],
) -> Result<Vec<u8>, WriteError> {
    let collection = LayerCollection {
        kind: "FeatureCollection",
        name: collection_name(layer, dataset),
        crs: Crs {
            kind: "name",
            properties: CrsProperties { name: CRS84 },
        },
        features,
    };
    let mut bytes =
        serde_json::to_vec_pretty(&collection).map_err(|source| WriteError::Serialise {
            layer: layer.clone(),
            source,
        })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes one file per layer beneath an output directory.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use trailmap_core::{DatasetId, LayerName};
/// use trailmap_data::writer::CollectionWriter;
///
/// let dir = tempfile::tempdir().expect("create temp directory");
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
/// let writer = CollectionWriter::new(&root);
/// let layer = LayerName::new("Camp Sites").expect("valid layer");
/// let dataset = DatasetId::new("abc").expect("valid id");
/// let path = writer.write(&layer, &dataset, &[]).expect("write layer");
/// assert_eq!(path, root.join("camp_sites.geojson"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWriter {
    output_dir: Utf8PathBuf,
}

impl CollectionWriter {
    /// Write layers beneath `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// File that `layer` is written to.
    #[must_use]
    pub fn path_for(&self, layer: &LayerName) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}.{LAYER_EXTENSION}", layer.file_stem()))
    }

    /// Atomically replace the layer file with `features`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] when serialisation or the filesystem fails.
    pub fn write(
        &self,
        layer: &LayerName,
        dataset: &DatasetId,
        features: &[Feature],
    ) -> Result<Utf8PathBuf, WriteError> {
        let bytes = render_collection(layer, dataset, features)?;
        let path = self.path_for(layer);
        trailmap_fs::write_atomically(&path, &bytes).map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;
        info!(
            "wrote {} features for layer {layer} to {path}",
            features.len()
        );
        Ok(path)
    }
}
