//! Structural validation of feature geometries.
//!
//! Validation dispatches on the geometry kind. Multi-part kinds delegate to
//! the rule of their singular counterpart element by element, and an empty
//! multi-part geometry is treated as absent data.

use geo::{Coord, LineString};
use serde_json::Value;
use thiserror::Error;

use crate::Geometry;

const MIN_LINE_POINTS: usize = 2;
const MIN_RING_POINTS: usize = 4;

/// Reason a geometry was refused.
///
/// Rejection is routine filtering rather than a failure; the variants exist so
/// callers can log why a feature was dropped.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    /// The feature carried no geometry.
    #[error("feature has no geometry")]
    MissingGeometry,
    /// The geometry carried no coordinate data.
    #[error("geometry has no coordinates")]
    MissingCoordinates,
    /// A position was not an array of at least two numbers.
    #[error("position is not a numeric coordinate pair")]
    MalformedPosition,
    /// A position fell outside the geographic bounds.
    #[error("position lies outside longitude [-180, 180] or latitude [-90, 90]")]
    OutOfBounds,
    /// A line string had fewer than two points, or a ring fewer than four.
    #[error("too few points")]
    TooFewPoints,
    /// A polygon had no rings.
    #[error("polygon has no rings")]
    NoRings,
    /// A ring's first and last positions differ.
    #[error("polygon ring is not closed")]
    UnclosedRing,
    /// A multi-part geometry had no members.
    #[error("multi-part geometry is empty")]
    EmptyCollection,
    /// The geometry kind is not one of the six supported kinds.
    #[error("unsupported geometry kind")]
    UnsupportedKind,
}

/// Check whether a longitude/latitude pair lies within geographic bounds.
///
/// # Examples
/// ```
/// use trailmap_core::is_valid_coordinate;
///
/// assert!(is_valid_coordinate(-9.142, 38.736));
/// assert!(!is_valid_coordinate(200.0, 38.736));
/// ```
#[must_use]
pub fn is_valid_coordinate(lon: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

/// Decide whether a feature's geometry is structurally valid.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use trailmap_core::{Geometry, Rejection, validate_geometry};
///
/// let ring = Geometry::Polygon { coordinates: json!([[[0, 0], [1, 0], [1, 1]]]) };
/// assert_eq!(validate_geometry(Some(&ring)), Err(Rejection::TooFewPoints));
/// assert_eq!(validate_geometry(None), Err(Rejection::MissingGeometry));
/// ```
pub fn validate_geometry(geometry: Option<&Geometry>) -> Result<(), Rejection> {
    let geometry = geometry.ok_or(Rejection::MissingGeometry)?;
    match geometry {
        Geometry::Point { coordinates } => point(coordinates).map(drop),
        Geometry::LineString { coordinates } => line_string(coordinates),
        Geometry::Polygon { coordinates } => polygon(coordinates),
        Geometry::MultiPoint { coordinates } => each_member(coordinates, |item| point(item).map(drop)),
        Geometry::MultiLineString { coordinates } => each_member(coordinates, line_string),
        Geometry::MultiPolygon { coordinates } => each_member(coordinates, polygon),
        Geometry::Unsupported => Err(Rejection::UnsupportedKind),
    }
}

/// Boolean view of [`validate_geometry`].
#[must_use]
pub fn is_valid_geometry(geometry: Option<&Geometry>) -> bool {
    validate_geometry(geometry).is_ok()
}

fn members(value: &Value) -> Result<&[Value], Rejection> {
    match value {
        Value::Null => Err(Rejection::MissingCoordinates),
        Value::Array(items) => Ok(items),
        _ => Err(Rejection::MalformedPosition),
    }
}

fn point(value: &Value) -> Result<Coord<f64>, Rejection> {
    let parts = members(value)?;
    // A third member is elevation and plays no part in validity.
    let [lon, lat, ..] = parts else {
        return Err(Rejection::MalformedPosition);
    };
    let (Some(x), Some(y)) = (lon.as_f64(), lat.as_f64()) else {
        return Err(Rejection::MalformedPosition);
    };
    if is_valid_coordinate(x, y) {
        Ok(Coord { x, y })
    } else {
        Err(Rejection::OutOfBounds)
    }
}

fn positions(value: &Value, minimum: usize) -> Result<LineString<f64>, Rejection> {
    let parts = members(value)?;
    if parts.len() < minimum {
        return Err(Rejection::TooFewPoints);
    }
    parts
        .iter()
        .map(point)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::from)
}

fn line_string(value: &Value) -> Result<(), Rejection> {
    positions(value, MIN_LINE_POINTS).map(drop)
}

fn ring(value: &Value) -> Result<(), Rejection> {
    let ring = positions(value, MIN_RING_POINTS)?;
    if ring.is_closed() {
        Ok(())
    } else {
        Err(Rejection::UnclosedRing)
    }
}

fn polygon(value: &Value) -> Result<(), Rejection> {
    let rings = members(value)?;
    if rings.is_empty() {
        return Err(Rejection::NoRings);
    }
    rings.iter().try_for_each(ring)
}

fn each_member<F>(value: &Value, rule: F) -> Result<(), Rejection>
where
    F: Fn(&Value) -> Result<(), Rejection>,
{
    let items = members(value)?;
    if items.is_empty() {
        return Err(Rejection::EmptyCollection);
    }
    items.iter().try_for_each(rule)
}
