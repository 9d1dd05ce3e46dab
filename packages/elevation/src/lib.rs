#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ward terrain statistics from the OpenTopodata elevation API.
//!
//! The risk scorer wants an average elevation and slope per ward;
//! [`TerrainProvider`] is the seam, [`OpenTopodataClient`] the live
//! implementation (bounded timeouts, bounded retries with backoff), and
//! [`StaticTerrain`] a fixed table for tests and offline runs. Terrain
//! data is optional everywhere: a provider returning `Ok(None)` simply
//! leaves the scorer on density-only weighting.

pub mod opentopodata;
pub mod retry;

use std::collections::BTreeMap;

use async_trait::async_trait;
use geo::MultiPolygon;
pub use opentopodata::OpenTopodataClient;
use waterlog_map_geography_models::TerrainStats;

/// Errors from the elevation service.
#[derive(Debug, thiserror::Error)]
pub enum ElevationError {
    /// HTTP request failed permanently.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transient failure that survived all retries.
    #[error("elevation service unavailable: {message}")]
    Transient {
        /// Description of the last failure.
        message: String,
    },

    /// The service answered with an unexpected payload.
    #[error("unexpected elevation response: {message}")]
    Decode {
        /// Description of what went wrong.
        message: String,
    },
}

/// Source of per-ward terrain statistics.
#[async_trait]
pub trait TerrainProvider: Send + Sync {
    /// Returns terrain statistics for a ward, or `Ok(None)` when no data
    /// covers it.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError`] when the backing service fails after
    /// bounded retries.
    async fn ward_terrain(
        &self,
        ward_id: i64,
        polygon: &MultiPolygon<f64>,
    ) -> Result<Option<TerrainStats>, ElevationError>;
}

/// Fixed per-ward terrain table.
#[derive(Debug, Default, Clone)]
pub struct StaticTerrain {
    stats: BTreeMap<i64, TerrainStats>,
}

impl StaticTerrain {
    /// Builds a table from (ward id, stats) pairs.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (i64, TerrainStats)>) -> Self {
        Self {
            stats: entries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TerrainProvider for StaticTerrain {
    async fn ward_terrain(
        &self,
        ward_id: i64,
        _polygon: &MultiPolygon<f64>,
    ) -> Result<Option<TerrainStats>, ElevationError> {
        Ok(self.stats.get(&ward_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString, Polygon};

    use super::*;

    #[tokio::test]
    async fn static_terrain_answers_from_the_table() {
        let provider = StaticTerrain::new([(
            1,
            TerrainStats {
                elevation_avg: Some(212.0),
                slope_avg: Some(0.8),
            },
        )]);

        let ring = LineString::from(vec![
            Coord { x: 77.0, y: 28.0 },
            Coord { x: 77.1, y: 28.0 },
            Coord { x: 77.1, y: 28.1 },
            Coord { x: 77.0, y: 28.1 },
            Coord { x: 77.0, y: 28.0 },
        ]);
        let polygon = MultiPolygon(vec![Polygon::new(ring, vec![])]);

        let stats = provider.ward_terrain(1, &polygon).await.unwrap().unwrap();
        assert_eq!(stats.elevation_avg, Some(212.0));
        assert!(provider.ward_terrain(2, &polygon).await.unwrap().is_none());
    }
}
