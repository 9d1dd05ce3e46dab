//! Ward polygon area in km².
//!
//! Uses the planar-degrees convention the scoring model was calibrated
//! against: the unsigned planar area of the WGS84 polygon in square
//! degrees, scaled by 111 km per degree on each axis. Good enough at
//! city scale; the density thresholds bake in the same approximation.

use geo::{Area, MultiPolygon};

/// Kilometers per degree of latitude/longitude at city scale.
const KM_PER_DEGREE: f64 = 111.0;

/// Below this area a ward polygon is treated as degenerate.
pub const MIN_AREA_SQ_KM: f64 = 1e-6;

/// Returns the ward polygon area in km².
#[must_use]
pub fn area_sq_km(polygon: &MultiPolygon<f64>) -> f64 {
    polygon.unsigned_area() * KM_PER_DEGREE * KM_PER_DEGREE
}

/// Returns `true` if the polygon's area is too small to divide by.
///
/// A degenerate boundary is a data error in the source file, not a
/// runtime fault; callers log it and use a density of zero.
#[must_use]
pub fn is_degenerate(area_sq_km: f64) -> bool {
    !(area_sq_km.is_finite() && area_sq_km >= MIN_AREA_SQ_KM)
}
