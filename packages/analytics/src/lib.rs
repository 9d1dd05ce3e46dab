#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ward risk scoring, the snapshot aggregation pass, and `GeoJSON`
//! builders for the map endpoints.
//!
//! Everything in this crate is a pure computation over a read-only
//! snapshot of reports and wards: degenerate geographic input is
//! recovered locally with a safe default and a warning, never an error.
//! Publishing the results back to the store is the caller's job, done in
//! one atomic operation so an abandoned pass leaves nothing behind.

pub mod aggregate;
pub mod heatmap;
pub mod scoring;
