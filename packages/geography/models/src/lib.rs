#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Ward record and boundary types.
//!
//! A ward is the administrative sub-area used as the unit of spatial
//! aggregation. The serializable [`Ward`] record carries the derived risk
//! fields; the geometry lives separately in [`WardBoundary`] /
//! [`WardShape`] because polygons are loaded once at startup and never go
//! over the wire except as `GeoJSON`.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// A ward record with its derived risk fields.
///
/// `risk_score`, `incident_density`, and the terrain averages are
/// recomputed by the aggregation pass; nothing here is user-mutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ward {
    /// Primary key.
    pub id: i64,
    /// Official ward number, unique.
    pub ward_number: String,
    /// Human-readable ward name.
    pub ward_name: String,
    /// Derived risk score in `[0, 100]`.
    pub risk_score: f64,
    /// Average elevation in meters, when terrain data exists.
    pub elevation_avg: Option<f64>,
    /// Average slope in degrees, when terrain data exists.
    pub slope_avg: Option<f64>,
    /// Incidents per km², `>= 0`.
    pub incident_density: f64,
}

impl Ward {
    /// Creates a ward record with zeroed derived fields.
    #[must_use]
    pub const fn new(id: i64, ward_number: String, ward_name: String) -> Self {
        Self {
            id,
            ward_number,
            ward_name,
            risk_score: 0.0,
            elevation_avg: None,
            slope_avg: None,
            incident_density: 0.0,
        }
    }
}

/// A ward boundary as parsed from the boundary `GeoJSON` file, before the
/// store has assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct WardBoundary {
    /// Official ward number.
    pub ward_number: String,
    /// Human-readable ward name.
    pub ward_name: String,
    /// Boundary polygon (WGS84).
    pub polygon: MultiPolygon<f64>,
}

/// A registered ward's geometry, keyed by its store id.
#[derive(Debug, Clone, PartialEq)]
pub struct WardShape {
    /// Store id of the ward.
    pub ward_id: i64,
    /// Boundary polygon (WGS84).
    pub polygon: MultiPolygon<f64>,
}

/// Terrain statistics for one ward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainStats {
    /// Average elevation in meters.
    pub elevation_avg: Option<f64>,
    /// Average slope in degrees.
    pub slope_avg: Option<f64>,
}
