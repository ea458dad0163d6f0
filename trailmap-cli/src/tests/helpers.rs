//! Test helpers for driving the ingest command against in-memory collaborators.

use super::*;
use crate::ingest::{Collaborators, CollaboratorBuilder, IngestConfig};
use camino::Utf8PathBuf;
use serde_json::json;
use tempfile::TempDir;
use trailmap_data::test_support::{
    StubConverter, StubDatasetSource, StubMediaTransport, feature_collection, point_feature,
    sample_kml,
};

pub(super) const PHOTO: &str = "https://photos.example/summit.jpg";

/// Serves the same published dataset for every layer.
pub(super) struct StubCollaborators {
    payload: Vec<u8>,
    document: Vec<u8>,
}

impl StubCollaborators {
    /// One valid point with a photo and one unclosed ring.
    pub(super) fn published() -> Self {
        Self {
            payload: sample_kml(),
            document: feature_collection(&[
                point_feature(-9.142, 38.736, &json!({"name": "summit", "media_links": PHOTO})),
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]},
                    "properties": {"name": "open ring"}
                }),
            ]),
        }
    }

    /// A sign-in page instead of a KML export.
    pub(super) fn private() -> Self {
        Self {
            payload: b"<html><body>Sign in</body></html>".to_vec(),
            document: feature_collection(&[]),
        }
    }
}

impl CollaboratorBuilder for StubCollaborators {
    fn build(&self, _config: &IngestConfig) -> Result<Collaborators, CliError> {
        Ok(Collaborators {
            source: Box::new(StubDatasetSource::with_payload(self.payload.clone())),
            converter: Box::new(StubConverter::with_output(self.document.clone())),
            media: Box::new(StubMediaTransport::new().with_asset(PHOTO, b"jpeg".to_vec())),
        })
    }
}

/// Temporary workspace with UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}
