//! Facade crate for the Trailmap ingestion pipeline.
//!
//! This crate re-exports the domain types from `trailmap-core` and the
//! pipeline adapters from `trailmap-data` so downstream tooling can depend on
//! a single crate.

#![forbid(unsafe_code)]

pub use trailmap_core::{
    DatasetId, DatasetIdError, Feature, FilterOutcome, Geometry, LayerName, LayerNameError,
    Properties, Rejection, filter_features, is_valid_coordinate, is_valid_geometry,
    validate_geometry,
};

pub use trailmap_data::convert::{CommandConverter, ConversionError, Converter};
pub use trailmap_data::media::{
    HttpMediaTransport, MediaAsset, MediaAssetError, MediaCache, MediaReport, MediaSettings,
    MediaTransport,
};
pub use trailmap_data::pipeline::{
    LayerJob, LayerReport, Pipeline, PipelineError, PipelineSettings, RunLog, RunReport,
};
pub use trailmap_data::source::{DatasetSource, HttpDatasetSource, HttpSourceConfig, SourceError};
pub use trailmap_data::transport::TransportError;
pub use trailmap_data::writer::{CollectionWriter, WriteError};
