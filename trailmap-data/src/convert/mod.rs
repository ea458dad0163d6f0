//! Conversion of raw KML payloads into typed features.
//!
//! The conversion itself is delegated to an external tool behind the
//! [`Converter`] trait; this module owns the contract around it: empty output
//! is an error, and the output must be a feature collection.
#![forbid(unsafe_code)]

mod command;
mod document;
mod error;

pub use command::{CommandConverter, DEFAULT_CONVERTER_PROGRAM, INPUT_PLACEHOLDER};
pub use document::parse_collection;
pub use error::ConversionError;

use async_trait::async_trait;
use log::info;
use trailmap_core::Feature;

use crate::source::RawDataset;

/// Turns a persisted raw payload into interchange-format bytes.
#[async_trait(?Send)]
pub trait Converter {
    /// Short name of the conversion tool, used in errors and logs.
    fn name(&self) -> &str;
    /// Convert `raw`, returning the tool's standard output.
    async fn convert(&self, raw: &RawDataset) -> Result<Vec<u8>, ConversionError>;
}

/// Convert `raw` and decode the resulting feature collection.
///
/// Features are numbered by their position in the converter output.
///
/// # Examples
/// ```
/// # use camino::Utf8PathBuf;
/// # use serde_json::json;
/// # use trailmap_core::DatasetId;
/// # use trailmap_data::convert::convert_dataset;
/// # use trailmap_data::source::RawDataset;
/// # use trailmap_data::test_support::{StubConverter, block_on_for_tests, feature_collection, point_feature};
/// let converter = StubConverter::with_output(feature_collection(&[
///     point_feature(1.0, 2.0, &json!({"name": "a"})),
///     point_feature(3.0, 4.0, &json!({"name": "b"})),
/// ]));
/// let raw = RawDataset {
///     dataset: DatasetId::new("abc").expect("valid id"),
///     bytes: Vec::new(),
///     scratch_path: Utf8PathBuf::from("trails_abc.kml"),
/// };
/// let features = block_on_for_tests(convert_dataset(&converter, &raw)).expect("convert");
/// assert_eq!(features.len(), 2);
/// assert_eq!(features[1].position(), 1);
/// ```
pub async fn convert_dataset<C: Converter + ?Sized>(
    converter: &C,
    raw: &RawDataset,
) -> Result<Vec<Feature>, ConversionError> {
    info!(
        "converting {} for dataset {} with {}",
        raw.scratch_path,
        raw.dataset,
        converter.name()
    );
    let output = converter.convert(raw).await?;
    if output.iter().all(u8::is_ascii_whitespace) {
        return Err(ConversionError::NoOutput {
            program: converter.name().to_owned(),
        });
    }
    parse_collection(output)
}
