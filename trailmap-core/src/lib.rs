//! Core domain types for the Trailmap ingestion pipeline.
//!
//! Everything in this crate is pure: geometry validation and feature filtering
//! perform no I/O, so they can be exercised directly without network or
//! filesystem fixtures. Adapters that talk to the outside world live in
//! `trailmap-data`.
#![forbid(unsafe_code)]

pub mod feature;
pub mod filter;
pub mod geometry;
pub mod layer;
pub mod validate;

pub use feature::{Feature, Properties};
pub use filter::{FilterOutcome, filter_features};
pub use geometry::Geometry;
pub use layer::{DatasetId, DatasetIdError, LayerName, LayerNameError};
pub use validate::{Rejection, is_valid_coordinate, is_valid_geometry, validate_geometry};
