//! Geometry model for interchange features.
//!
//! Each supported kind keeps its `coordinates` member as raw JSON so that a
//! feature accepted by the validator is written back exactly as it arrived.
//! Structural checks live in [`crate::validate`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tagged geometry as found in an interchange document.
///
/// Unknown kinds, and geometry objects that fail to decode, become
/// [`Geometry::Unsupported`] rather than failing the whole document.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use trailmap_core::Geometry;
///
/// let point = Geometry::from_value(json!({"type": "Point", "coordinates": [1.0, 2.0]}));
/// assert_eq!(point.kind(), "Point");
/// let other = Geometry::from_value(json!({"type": "GeometryCollection", "geometries": []}));
/// assert_eq!(other, Geometry::Unsupported);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position.
    Point {
        #[serde(default)]
        coordinates: Value,
    },
    /// An open path of two or more positions.
    LineString {
        #[serde(default)]
        coordinates: Value,
    },
    /// One exterior ring followed by optional holes.
    Polygon {
        #[serde(default)]
        coordinates: Value,
    },
    /// A set of points.
    MultiPoint {
        #[serde(default)]
        coordinates: Value,
    },
    /// A set of line strings.
    MultiLineString {
        #[serde(default)]
        coordinates: Value,
    },
    /// A set of polygons.
    MultiPolygon {
        #[serde(default)]
        coordinates: Value,
    },
    /// Any other, unknown or undecodable geometry.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Decode a geometry from an arbitrary JSON value without failing.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or(Self::Unsupported)
    }

    /// Name of the geometry kind as it appears in the `type` member.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::LineString { .. } => "LineString",
            Self::Polygon { .. } => "Polygon",
            Self::MultiPoint { .. } => "MultiPoint",
            Self::MultiLineString { .. } => "MultiLineString",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::Unsupported => "Unsupported",
        }
    }
}

/// Deserialize an optional geometry, mapping undecodable objects to
/// [`Geometry::Unsupported`] and `null` to `None`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Geometry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(Geometry::from_value))
}
