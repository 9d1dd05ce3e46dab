#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ward boundary loading and area computation.
//!
//! Parses ward polygons from a `GeoJSON` boundary file (tolerant of the
//! property naming variations seen in municipal open data exports) and
//! provides the planar area convention used by the density computation.

pub mod area;
pub mod loader;

use thiserror::Error;

/// Errors that can occur while loading boundary data.
#[derive(Debug, Error)]
pub enum GeoError {
    /// I/O error reading the boundary file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    Geojson(#[from] geojson::Error),

    /// The boundary file parsed but contained no usable ward polygons.
    #[error("no usable ward boundaries in {path}")]
    Empty {
        /// Path of the offending file.
        path: String,
    },
}
