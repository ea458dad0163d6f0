//! Features as produced by the format converter and written to layer files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Geometry;
use crate::geometry::deserialize_lenient;

/// Feature properties keyed by name.
///
/// A `BTreeMap` keeps serialization order stable across runs.
pub type Properties = BTreeMap<String, Value>;

/// A tagged geometry with its properties and input position.
///
/// `position` is the zero-based index of the feature in converter output. It
/// survives filtering and names downloaded media, but is never serialized.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use trailmap_core::{Feature, Geometry, Properties};
///
/// let feature = Feature::new(
///     3,
///     Some(Geometry::Point { coordinates: json!([-9.142, 38.736]) }),
///     Properties::from([("name".to_owned(), json!("Lisbon"))]),
/// );
/// let text = serde_json::to_string(&feature).expect("serialize feature");
/// assert_eq!(
///     text,
///     r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[-9.142,38.736]},"properties":{"name":"Lisbon"}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", from = "FeatureRecord")]
pub struct Feature {
    #[serde(skip_serializing)]
    position: usize,
    geometry: Option<Geometry>,
    properties: Properties,
}

#[derive(Deserialize)]
struct FeatureRecord {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

impl From<FeatureRecord> for Feature {
    fn from(record: FeatureRecord) -> Self {
        Self::new(0, record.geometry, record.properties.unwrap_or_default())
    }
}

impl Feature {
    /// Construct a feature at the given input position.
    #[must_use]
    pub const fn new(position: usize, geometry: Option<Geometry>, properties: Properties) -> Self {
        Self {
            position,
            geometry,
            properties,
        }
    }

    /// Return the feature re-indexed to `position`.
    #[must_use]
    pub fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Zero-based index of the feature in converter output.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Geometry, if the feature carried one.
    #[must_use]
    pub const fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Feature properties.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a property holding a string value.
    #[must_use]
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// Replace the value of a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Remove a property, returning its previous value.
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }
}
