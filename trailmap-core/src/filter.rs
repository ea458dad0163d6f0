//! Order-preserving selection of structurally valid features.

use log::debug;

use crate::{Feature, validate_geometry};

/// Result of [`filter_features`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    /// Valid features in their original order.
    pub valid: Vec<Feature>,
    /// Number of features inspected.
    pub total: usize,
}

impl FilterOutcome {
    /// Number of features that passed validation.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    /// Number of features that were dropped.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.total.saturating_sub(self.valid.len())
    }
}

/// Keep the features whose geometry is valid, preserving input order.
///
/// Features are moved, never modified. Rejection is silent apart from a
/// `debug` log line naming the feature position and reason.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use trailmap_core::{Feature, Geometry, Properties, filter_features};
///
/// let inside = Feature::new(0, Some(Geometry::Point { coordinates: json!([-9.142, 38.736]) }), Properties::new());
/// let outside = Feature::new(1, Some(Geometry::Point { coordinates: json!([200, 38.736]) }), Properties::new());
/// let outcome = filter_features(vec![inside.clone(), outside]);
/// assert_eq!(outcome.valid, vec![inside]);
/// assert_eq!(outcome.total, 2);
/// assert_eq!(outcome.rejected_count(), 1);
/// ```
pub fn filter_features<I>(features: I) -> FilterOutcome
where
    I: IntoIterator<Item = Feature>,
{
    let mut outcome = FilterOutcome::default();
    for feature in features {
        outcome.total += 1;
        match validate_geometry(feature.geometry()) {
            Ok(()) => outcome.valid.push(feature),
            Err(reason) => debug!("dropping feature {}: {reason}", feature.position()),
        }
    }
    outcome
}
