use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use trailmap_core::DatasetId;

use super::{DatasetSource, SourceError};

/// Number of leading bytes inspected when deciding whether a payload is KML.
pub const SNIFF_WINDOW: usize = 1024;

/// Length of the payload preview carried by [`SourceError::NotKml`].
const PREVIEW_CHARS: usize = 80;

/// A downloaded KML payload and its scratch location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    /// Dataset the payload belongs to.
    pub dataset: DatasetId,
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
    /// Where the payload was persisted for the converter.
    pub scratch_path: Utf8PathBuf,
}

/// Report whether `bytes` look like a KML document.
///
/// Only the first [`SNIFF_WINDOW`] bytes are inspected, case-insensitively,
/// for the `<kml` marker.
///
/// # Examples
/// ```
/// use trailmap_data::source::looks_like_kml;
///
/// assert!(looks_like_kml(b"<?xml version=\"1.0\"?><KML xmlns=\"x\"></KML>"));
/// assert!(!looks_like_kml(b"<!DOCTYPE html><html>Sign in</html>"));
/// ```
#[must_use]
pub fn looks_like_kml(bytes: &[u8]) -> bool {
    let window = bytes.get(..SNIFF_WINDOW).unwrap_or(bytes);
    String::from_utf8_lossy(window)
        .to_ascii_lowercase()
        .contains("<kml")
}

fn preview(bytes: &[u8]) -> String {
    let window = bytes.get(..SNIFF_WINDOW).unwrap_or(bytes);
    String::from_utf8_lossy(window)
        .chars()
        .take(PREVIEW_CHARS)
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Download `dataset`, persist it to `scratch_path` and verify it is KML.
///
/// The payload is written before sniffing so a rejected body can be inspected
/// after the run.
///
/// # Examples
/// ```
/// # use camino::Utf8PathBuf;
/// # use trailmap_core::DatasetId;
/// # use trailmap_data::source::fetch_dataset;
/// # use trailmap_data::test_support::{StubDatasetSource, block_on_for_tests, sample_kml};
/// let scratch = tempfile::tempdir().expect("create temp directory");
/// let path = Utf8PathBuf::from_path_buf(scratch.path().join("trails_abc.kml")).expect("utf-8 path");
/// let source = StubDatasetSource::with_payload(sample_kml());
/// let dataset = DatasetId::new("abc").expect("valid id");
/// let raw = block_on_for_tests(fetch_dataset(&source, &dataset, &path)).expect("fetch dataset");
/// assert_eq!(raw.scratch_path, path);
/// assert!(path.exists());
/// ```
pub async fn fetch_dataset<S: DatasetSource + ?Sized>(
    source: &S,
    dataset: &DatasetId,
    scratch_path: &Utf8Path,
) -> Result<RawDataset, SourceError> {
    info!("downloading dataset {dataset} from {}", source.describe(dataset));
    let bytes = source
        .fetch_raw(dataset)
        .await
        .map_err(|err| SourceError::Transport {
            dataset: dataset.clone(),
            source: err,
        })?;
    trailmap_fs::write_atomically(scratch_path, &bytes).map_err(|err| {
        SourceError::PersistRaw {
            dataset: dataset.clone(),
            path: scratch_path.to_path_buf(),
            source: err,
        }
    })?;
    debug!(
        "persisted {} bytes for dataset {dataset} to {scratch_path}",
        bytes.len()
    );
    if !looks_like_kml(&bytes) {
        return Err(SourceError::NotKml {
            dataset: dataset.clone(),
            preview: preview(&bytes),
        });
    }
    Ok(RawDataset {
        dataset: dataset.clone(),
        bytes,
        scratch_path: scratch_path.to_path_buf(),
    })
}
