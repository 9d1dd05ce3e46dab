//! Flood-risk score for a single ward.
//!
//! A weighted combination of normalized incident density and, when
//! terrain data exists, normalized inverse elevation and normalized
//! slope. The curves are calibrated for Delhi (elevation roughly
//! 200–300 m, mostly flat terrain): lower ground and flatter slopes
//! accumulate water, so both push the score up.
//!
//! Contract independent of the weight policy: monotonic in density,
//! clamped to `[0, 100]` for arbitrary inputs, and fully deterministic.

use waterlog_map_analytics_models::RiskWeights;

/// Input factors for one ward's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WardFeatures {
    /// Incidents per km².
    pub incident_density: f64,
    /// Average elevation in meters, when known.
    pub elevation_avg: Option<f64>,
    /// Average slope in degrees, when known.
    pub slope_avg: Option<f64>,
}

/// Computes the risk score in `[0, 100]`.
///
/// Missing terrain factors redistribute their weight: each normalized
/// factor is weighted, summed, and divided by the sum of the weights
/// actually present. With every factor present and the default weights
/// this is exactly `0.45·density + 0.30·elevation + 0.25·slope`; with no
/// terrain data it degrades to the raw density curve.
#[must_use]
pub fn score(features: &WardFeatures, weights: RiskWeights) -> f64 {
    let mut weighted = weights.density * normalize_density(features.incident_density);
    let mut weight_sum = weights.density;

    if let Some(elevation) = features.elevation_avg.filter(|v| v.is_finite()) {
        weighted += weights.elevation * normalize_elevation_risk(elevation);
        weight_sum += weights.elevation;
    }

    if let Some(slope) = features.slope_avg.filter(|v| v.is_finite()) {
        weighted += weights.slope * normalize_slope_risk(slope);
        weight_sum += weights.slope;
    }

    if weight_sum <= 0.0 {
        return 0.0;
    }

    let score = weighted / weight_sum;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Lower ground holds water: 100 below 200 m, 0 above 300 m, linear
/// in between.
fn normalize_elevation_risk(elevation: f64) -> f64 {
    if elevation < 200.0 {
        100.0
    } else if elevation > 300.0 {
        0.0
    } else {
        100.0 - (elevation - 200.0)
    }
}

/// Flatter terrain accumulates water: 90 below 0.5°, 10 above 5°,
/// linear in between.
fn normalize_slope_risk(slope: f64) -> f64 {
    if slope < 0.5 {
        90.0
    } else if slope > 5.0 {
        10.0
    } else {
        90.0 - (slope / 5.0) * 80.0
    }
}

/// Step curve over incidents per km². Non-finite or negative densities
/// land in the lowest step.
fn normalize_density(density: f64) -> f64 {
    if density > 10.0 {
        100.0
    } else if density > 5.0 {
        70.0
    } else if density > 2.0 {
        40.0
    } else if density > 0.5 {
        20.0
    } else {
        5.0
    }
}
