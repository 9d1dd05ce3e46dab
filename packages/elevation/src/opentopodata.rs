//! OpenTopodata client.
//!
//! Samples a handful of points over the ward polygon (centroid plus
//! bounding box corners and edge midpoints), fetches their elevations in
//! one batched request (`locations=lat,lon|lat,lon|...`), and estimates
//! the ward's average elevation and slope. Slope is approximated from
//! the elevation difference between the centroid and each outer sample
//! over the planar-degrees distance convention used by the density
//! computation.

use std::time::Duration;

use async_trait::async_trait;
use geo::{BoundingRect, Centroid, MultiPolygon};
use waterlog_map_geography_models::TerrainStats;

use crate::{ElevationError, TerrainProvider, retry};

/// Per-request timeout; elevation lookups must never hang a pass.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kilometers per degree, matching the density area convention.
const KM_PER_DEGREE: f64 = 111.0;

/// Client for an `OpenTopodata`-compatible elevation service.
pub struct OpenTopodataClient {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
}

impl OpenTopodataClient {
    /// Creates a client against a base URL (e.g.
    /// `https://api.opentopodata.org`) and dataset name.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, dataset: &str) -> Result<Self, ElevationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
        })
    }

    async fn fetch_elevations(
        &self,
        locations: &[(f64, f64)],
    ) -> Result<Vec<Option<f64>>, ElevationError> {
        let loc_param = locations
            .iter()
            .map(|(lat, lon)| format!("{lat},{lon}"))
            .collect::<Vec<_>>()
            .join("|");
        let url = format!(
            "{}/v1/{}?locations={loc_param}",
            self.base_url, self.dataset
        );

        let body = retry::send_json(|| self.client.get(&url)).await?;
        parse_elevations(&body, locations.len())
    }
}

#[async_trait]
impl TerrainProvider for OpenTopodataClient {
    async fn ward_terrain(
        &self,
        ward_id: i64,
        polygon: &MultiPolygon<f64>,
    ) -> Result<Option<TerrainStats>, ElevationError> {
        let samples = sample_points(polygon);
        if samples.is_empty() {
            log::warn!("Ward {ward_id}: no sample points for terrain lookup");
            return Ok(None);
        }

        let elevations = self.fetch_elevations(&samples).await?;

        let known: Vec<(usize, f64)> = elevations
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.map(|v| (i, v)))
            .collect();

        if known.is_empty() {
            log::warn!("Ward {ward_id}: elevation service has no coverage");
            return Ok(None);
        }

        #[allow(clippy::cast_precision_loss)]
        let elevation_avg = known.iter().map(|(_, v)| v).sum::<f64>() / known.len() as f64;

        // The centroid is always the first sample; slope needs it plus at
        // least one outer point.
        let slope_avg = known
            .iter()
            .find(|(i, _)| *i == 0)
            .and_then(|&(_, center_elev)| {
                estimate_slope(samples[0], center_elev, &samples, &elevations)
            });

        Ok(Some(TerrainStats {
            elevation_avg: Some(elevation_avg),
            slope_avg,
        }))
    }
}

/// Sample points over the polygon: centroid first, then bounding box
/// corners and edge midpoints. Returns `(lat, lon)` pairs.
fn sample_points(polygon: &MultiPolygon<f64>) -> Vec<(f64, f64)> {
    let Some(rect) = polygon.bounding_rect() else {
        return Vec::new();
    };
    let Some(centroid) = polygon.centroid() else {
        return Vec::new();
    };

    let (min, max) = (rect.min(), rect.max());
    let mid_x = f64::midpoint(min.x, max.x);
    let mid_y = f64::midpoint(min.y, max.y);

    vec![
        (centroid.y(), centroid.x()),
        (min.y, min.x),
        (min.y, max.x),
        (max.y, min.x),
        (max.y, max.x),
        (min.y, mid_x),
        (max.y, mid_x),
        (mid_y, min.x),
        (mid_y, max.x),
    ]
}

/// Mean slope in degrees between the centroid and each outer sample with
/// a known elevation. `None` when every outer distance is degenerate.
fn estimate_slope(
    center: (f64, f64),
    center_elev: f64,
    samples: &[(f64, f64)],
    elevations: &[Option<f64>],
) -> Option<f64> {
    let mut slopes = Vec::new();

    for (sample, elevation) in samples.iter().zip(elevations).skip(1) {
        let Some(elevation) = elevation else {
            continue;
        };

        let d_lat = sample.0 - center.0;
        let d_lon = sample.1 - center.1;
        let distance_m = (d_lat.hypot(d_lon)) * KM_PER_DEGREE * 1000.0;
        if distance_m < 1.0 {
            continue;
        }

        let rise = (elevation - center_elev).abs();
        slopes.push((rise / distance_m).atan().to_degrees());
    }

    if slopes.is_empty() {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        Some(slopes.iter().sum::<f64>() / slopes.len() as f64)
    }
}

/// Pulls `results[i].elevation` out of an `OpenTopodata` response body.
fn parse_elevations(
    body: &serde_json::Value,
    expected: usize,
) -> Result<Vec<Option<f64>>, ElevationError> {
    let results = body
        .get("results")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| ElevationError::Decode {
            message: "response has no results array".to_string(),
        })?;

    if results.len() != expected {
        return Err(ElevationError::Decode {
            message: format!("expected {expected} results, got {}", results.len()),
        });
    }

    Ok(results
        .iter()
        .map(|r| r.get("elevation").and_then(serde_json::Value::as_f64))
        .collect())
}
