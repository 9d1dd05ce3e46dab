#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Risk category taxonomy and ward analytics aggregates.
//!
//! The four risk bands partition `[0, 100]` with inclusive lower bounds:
//! a score of exactly 75 is `CRITICAL`, not `HIGH`. The preparedness
//! advisory per band is a fixed business string; UIs and tests rely on
//! it being stable per category.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use waterlog_map_geography_models::Ward;

/// Risk band for a ward's 0–100 score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// Score below 25.
    Low,
    /// Score in `[25, 50)`.
    Medium,
    /// Score in `[50, 75)`.
    High,
    /// Score of 75 and above.
    Critical,
}

impl RiskCategory {
    /// Maps a risk score to its band. Total over all finite scores;
    /// NaN maps to `Low` rather than panicking.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::Critical
        } else if score >= 50.0 {
            Self::High
        } else if score >= 25.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Fixed preparedness advisory for this band.
    #[must_use]
    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::Critical => {
                "CRITICAL: Immediate action required. Deploy emergency response teams \
                 and drainage clearing units."
            }
            Self::High => {
                "HIGH: Proactive monitoring needed. Ensure drainage systems are clear \
                 and emergency teams are on standby."
            }
            Self::Medium => {
                "MEDIUM: Regular monitoring recommended. Schedule routine drainage \
                 maintenance."
            }
            Self::Low => {
                "LOW: Standard monitoring sufficient. Continue regular maintenance \
                 schedules."
            }
        }
    }
}

/// Weighting policy for the risk score factors.
///
/// The weights only matter relative to each other: the scorer divides by
/// the sum of the weights whose factors are present, so missing terrain
/// data redistributes weight instead of deflating the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Weight of normalized incident density.
    pub density: f64,
    /// Weight of normalized inverse elevation.
    pub elevation: f64,
    /// Weight of normalized slope.
    pub slope: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            density: 0.45,
            elevation: 0.30,
            slope: 0.25,
        }
    }
}

/// Result of scoring one ward during an aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredWard {
    /// Store id of the ward.
    pub ward_id: i64,
    /// Risk score in `[0, 100]`.
    pub risk_score: f64,
    /// Incidents per km² used for the score.
    pub incident_density: f64,
    /// Average elevation in meters, when terrain data was available.
    pub elevation_avg: Option<f64>,
    /// Average slope in degrees, when terrain data was available.
    pub slope_avg: Option<f64>,
}

/// View aggregate for a single ward's analytics page.
///
/// `CLOSED` reports count as resolved, so `open_reports +
/// resolved_reports <= total_reports` always holds (`IN_PROGRESS`
/// reports sit in total but in neither bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardAnalytics {
    /// The ward with its derived risk fields.
    pub ward: Ward,
    /// All reports assigned to the ward.
    pub total_reports: u64,
    /// Reports still in `OPEN`.
    pub open_reports: u64,
    /// Reports in `RESOLVED` or `CLOSED`.
    pub resolved_reports: u64,
    /// Mean hours from creation to resolution, `None` when no report
    /// carries a resolution timestamp.
    pub avg_resolution_time_hours: Option<f64>,
}
