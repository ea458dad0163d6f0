//! I/O adapters and orchestration for the Trailmap ingestion pipeline.
//!
//! Responsibilities:
//! - Download published datasets and verify they are KML.
//! - Drive the external format converter and decode its output.
//! - Localise remote media referenced from feature properties.
//! - Write deterministic layer files and run summaries.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `trailmap-core`).
//! - Network and subprocess collaborators sit behind traits so tests can
//!   substitute the stubs in [`test_support`].
//!
//! Invariants:
//! - No global mutable state; the media cache is owned by a single run.
//! - Every network request carries an explicit timeout.
#![forbid(unsafe_code)]

pub mod convert;
pub mod media;
pub mod pipeline;
pub mod source;
pub mod transport;
pub mod writer;

#[doc(hidden)]
pub mod test_support;
