use serde::Deserialize;
use trailmap_core::Feature;

use super::ConversionError;

const FEATURE_COLLECTION: &str = "FeatureCollection";

#[derive(Debug, Deserialize)]
struct InterchangeDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Option<Vec<Feature>>,
}

/// Decode converter output into features numbered by their position.
///
/// Features with missing or malformed geometry are kept; the validator
/// decides what to do with them.
///
/// # Errors
///
/// Returns [`ConversionError::Parse`] when the bytes are not JSON of the
/// expected shape and [`ConversionError::NotFeatureCollection`] when the
/// document is some other object.
pub fn parse_collection(mut output: Vec<u8>) -> Result<Vec<Feature>, ConversionError> {
    let document: InterchangeDocument = simd_json::serde::from_slice(&mut output)
        .map_err(|source| ConversionError::Parse { source })?;
    if document.kind != FEATURE_COLLECTION {
        return Err(ConversionError::NotFeatureCollection {
            found: document.kind,
        });
    }
    let features = document
        .features
        .ok_or_else(|| ConversionError::NotFeatureCollection {
            found: format!("{FEATURE_COLLECTION} without features"),
        })?;
    Ok(features
        .into_iter()
        .enumerate()
        .map(|(position, feature)| feature.at_position(position))
        .collect())
}
