//! The snapshot aggregation pass: assign reports to wards, compute
//! density, score, and produce the ward analytics aggregate.
//!
//! Runs over a consistent read snapshot; per-ward computation shares no
//! mutable state. The caller publishes the returned [`ScoredWard`] list
//! atomically — a pass abandoned before publication changes nothing.

use std::collections::BTreeMap;

use waterlog_map_analytics_models::{RiskWeights, ScoredWard, WardAnalytics};
use waterlog_map_geography::area;
use waterlog_map_geography_models::{TerrainStats, Ward, WardShape};
use waterlog_map_report_models::{Report, ReportStatus};
use waterlog_map_spatial::WardIndex;

use crate::scoring::{self, WardFeatures};

/// Read-only inputs for one aggregation pass.
pub struct AggregationInput<'a> {
    /// Snapshot of every stored report.
    pub reports: &'a [Report],
    /// Current ward records.
    pub wards: &'a [Ward],
    /// Registered ward geometries.
    pub shapes: &'a [WardShape],
    /// Terrain statistics by ward id, where available.
    pub terrain: &'a BTreeMap<i64, TerrainStats>,
    /// Weight policy for the scorer.
    pub weights: RiskWeights,
}

/// Recomputes density and risk score for every ward.
///
/// Reports without a stored ward assignment are attributed through the
/// spatial index; reports outside every boundary are excluded from
/// density but remain in the snapshot. A ward with a degenerate
/// (zero-area) boundary or no registered geometry gets density 0 with a
/// warning — a data error never aborts the pass.
#[must_use]
pub fn recompute(input: &AggregationInput<'_>, index: &WardIndex) -> Vec<ScoredWard> {
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    let mut unassigned = 0_u64;

    for report in input.reports {
        let ward_id = report
            .ward_id
            .or_else(|| index.assign_ward(report.longitude, report.latitude));

        match ward_id {
            Some(id) => *counts.entry(id).or_insert(0) += 1,
            None => unassigned += 1,
        }
    }

    if unassigned > 0 {
        log::warn!("{unassigned} reports fall outside every ward boundary");
    }

    let shapes_by_id: BTreeMap<i64, &WardShape> =
        input.shapes.iter().map(|s| (s.ward_id, s)).collect();

    let mut scored = Vec::with_capacity(input.wards.len());

    for ward in input.wards {
        let count = counts.get(&ward.id).copied().unwrap_or(0);
        let density = ward_density(ward, shapes_by_id.get(&ward.id).copied(), count);

        let terrain = input.terrain.get(&ward.id);
        let elevation_avg = terrain
            .and_then(|t| t.elevation_avg)
            .or(ward.elevation_avg);
        let slope_avg = terrain.and_then(|t| t.slope_avg).or(ward.slope_avg);

        let features = WardFeatures {
            incident_density: density,
            elevation_avg,
            slope_avg,
        };

        scored.push(ScoredWard {
            ward_id: ward.id,
            risk_score: scoring::score(&features, input.weights),
            incident_density: density,
            elevation_avg,
            slope_avg,
        });
    }

    scored
}

/// Incidents per km² for one ward, with degenerate-area recovery.
#[allow(clippy::cast_precision_loss)]
fn ward_density(ward: &Ward, shape: Option<&WardShape>, count: u64) -> f64 {
    let Some(shape) = shape else {
        log::warn!(
            "Ward {} ({}) has no registered geometry, density set to 0",
            ward.ward_number,
            ward.ward_name
        );
        return 0.0;
    };

    let area_sq_km = area::area_sq_km(&shape.polygon);
    if area::is_degenerate(area_sq_km) {
        log::warn!(
            "Ward {} ({}) has a degenerate boundary (area {area_sq_km} km²), \
             density set to 0",
            ward.ward_number,
            ward.ward_name
        );
        return 0.0;
    }

    count as f64 / area_sq_km
}

/// Computes the analytics aggregate for one ward from the snapshot.
///
/// `CLOSED` counts as resolved; the resolution-time average covers only
/// reports that actually carry a resolution timestamp.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ward_analytics(ward: &Ward, reports: &[Report]) -> WardAnalytics {
    let mut total = 0_u64;
    let mut open = 0_u64;
    let mut resolved = 0_u64;
    let mut resolution_hours = Vec::new();

    for report in reports.iter().filter(|r| r.ward_id == Some(ward.id)) {
        total += 1;
        match report.status {
            ReportStatus::Open => open += 1,
            s if s.counts_as_resolved() => resolved += 1,
            _ => {}
        }
        if let Some(resolved_at) = report.resolved_at {
            let hours = (resolved_at - report.created_at).num_seconds() as f64 / 3600.0;
            resolution_hours.push(hours);
        }
    }

    let avg_resolution_time_hours = if resolution_hours.is_empty() {
        None
    } else {
        Some(resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64)
    };

    WardAnalytics {
        ward: ward.clone(),
        total_reports: total,
        open_reports: open,
        resolved_reports: resolved,
        avg_resolution_time_hours,
    }
}
