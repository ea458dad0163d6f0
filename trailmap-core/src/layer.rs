//! Identifiers for layers and the remote datasets that feed them.

use std::fmt;

use thiserror::Error;

/// Human-facing name of a logical layer, such as `"Trails"`.
///
/// Names are trimmed and limited to ASCII letters, digits, spaces, `-` and
/// `_` so that [`LayerName::file_stem`] is always a safe file name.
///
/// # Examples
/// ```
/// use trailmap_core::LayerName;
///
/// # fn main() -> Result<(), trailmap_core::LayerNameError> {
/// let layer = LayerName::new(" Scenic Trails ")?;
/// assert_eq!(layer.as_str(), "Scenic Trails");
/// assert_eq!(layer.file_stem(), "scenic_trails");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerName(String);

/// Errors returned by [`LayerName::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerNameError {
    /// The name was empty after trimming.
    #[error("layer name must not be empty")]
    Empty,
    /// The name contained a character outside the permitted set.
    #[error("layer name {name:?} contains unsupported character {found:?}")]
    InvalidCharacter { name: String, found: char },
}

impl LayerName {
    /// Validate and construct a [`LayerName`].
    pub fn new(value: impl AsRef<str>) -> Result<Self, LayerNameError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LayerNameError::Empty);
        }
        if let Some(found) = trimmed
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_')))
        {
            return Err(LayerNameError::InvalidCharacter {
                name: trimmed.to_owned(),
                found,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the display form of the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase, underscore-separated stem used for the layer file and media prefix.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_lowercase()
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LayerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a dataset on the remote map-authoring service.
///
/// # Examples
/// ```
/// use trailmap_core::DatasetId;
///
/// let id = DatasetId::new("1AbC-dEf_9").expect("valid id");
/// assert_eq!(id.to_string(), "1AbC-dEf_9");
/// assert!(DatasetId::new("bad id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetId(String);

/// Errors returned by [`DatasetId::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetIdError {
    /// The identifier was empty after trimming.
    #[error("dataset id must not be empty")]
    Empty,
    /// The identifier contained a character that is not URL-safe.
    #[error("dataset id {id:?} contains unsupported character {found:?}")]
    InvalidCharacter { id: String, found: char },
}

impl DatasetId {
    /// Validate and construct a [`DatasetId`].
    pub fn new(value: impl AsRef<str>) -> Result<Self, DatasetIdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DatasetIdError::Empty);
        }
        if let Some(found) = trimmed
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')))
        {
            return Err(DatasetIdError::InvalidCharacter {
                id: trimmed.to_owned(),
                found,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Trails", "trails")]
    #[case("Scenic  Trails", "scenic_trails")]
    #[case("Points-of_Interest", "points-of_interest")]
    fn file_stem_is_lowercase_and_underscored(#[case] raw: &str, #[case] expected: &str) {
        let layer = LayerName::new(raw).expect("valid layer name");
        assert_eq!(layer.file_stem(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn layer_name_rejects_blank_input(#[case] raw: &str) {
        assert_eq!(LayerName::new(raw), Err(LayerNameError::Empty));
    }

    #[rstest]
    #[case("../etc", '.')]
    #[case("Trails/2024", '/')]
    fn layer_name_rejects_path_characters(#[case] raw: &str, #[case] bad: char) {
        match LayerName::new(raw) {
            Err(LayerNameError::InvalidCharacter { found, .. }) => assert_eq!(found, bad),
            other => panic!("expected invalid character error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("1a2B3c", true)]
    #[case("mid_with-dash", true)]
    #[case("has space", false)]
    #[case("q=1&x", false)]
    #[case("", false)]
    fn dataset_id_accepts_url_safe_tokens(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(DatasetId::new(raw).is_ok(), ok, "DatasetId::new({raw:?})");
    }
}
