#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report taxonomy, lifecycle, and validation types.
//!
//! This crate defines the canonical report vocabulary used across the
//! entire waterlog-map system: incident status lifecycle, severity levels,
//! responsible agencies, actor roles, and the field-level validation rules
//! applied to citizen submissions before anything reaches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Minimum title length for a report submission.
pub const TITLE_MIN_LEN: usize = 5;

/// Maximum title length for a report submission.
pub const TITLE_MAX_LEN: usize = 200;

/// Minimum description length for a report submission.
pub const DESCRIPTION_MIN_LEN: usize = 10;

/// Lifecycle status of an incident report.
///
/// The lifecycle only moves forward: `Open` < `InProgress` < `Resolved` <
/// `Closed`. Forward jumps are allowed (closing an open report directly),
/// backward transitions are rejected, so a resolution timestamp can never
/// be removed once set.
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
pub enum ReportStatus {
    /// Newly submitted, not yet triaged.
    Open,
    /// Acknowledged by an authority; work underway.
    InProgress,
    /// The underlying issue was fixed; resolution timestamp recorded.
    Resolved,
    /// Administratively closed; terminal.
    Closed,
}

impl ReportStatus {
    /// Returns `true` if a transition from `self` to `next` is allowed.
    ///
    /// Transitions are strictly forward along the lifecycle order.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self < next
    }

    /// Returns `true` if this status counts toward the "resolved" bucket
    /// in ward analytics. `Closed` reports count as resolved whether or
    /// not a resolution timestamp was recorded.
    #[must_use]
    pub const fn counts_as_resolved(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

/// Citizen-assigned urgency of a single incident report.
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
pub enum ReportSeverity {
    /// Nuisance-level pooling, passable.
    Low,
    /// Significant accumulation, slows traffic.
    Medium,
    /// Road partially impassable or property at risk.
    High,
    /// Dangerous flooding requiring immediate response.
    Critical,
}

impl Default for ReportSeverity {
    fn default() -> Self {
        Self::Medium
    }
}

/// Municipal body assigned responsibility for resolving a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Agency {
    /// Municipal Corporation of Delhi.
    Mcd,
    /// Public Works Department.
    Pwd,
    /// New Delhi Municipal Council.
    Ndmc,
    /// Delhi Development Authority.
    Dda,
    /// Any other responsible body.
    Other,
}

/// Role of an authenticated actor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular citizen: submits, upvotes, comments.
    Citizen,
    /// Municipal authority: triages and resolves reports.
    Authority,
    /// Administrator: everything an authority can do.
    Admin,
}

/// A closed set of actions an actor may perform.
///
/// Handlers check capabilities rather than comparing role names, so the
/// role-to-permission mapping lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create a new incident report.
    SubmitReport,
    /// Upvote an existing report.
    Upvote,
    /// Comment on an existing report.
    Comment,
    /// Update status, severity, agency, or resolution evidence.
    TriageReports,
    /// Read a report's audit trail.
    ViewAuditLog,
    /// Trigger a ward risk recomputation pass.
    RecomputeRisk,
}

impl UserRole {
    /// Returns the capabilities granted to this role.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Citizen => &[
                Capability::SubmitReport,
                Capability::Upvote,
                Capability::Comment,
            ],
            Self::Authority | Self::Admin => &[
                Capability::SubmitReport,
                Capability::Upvote,
                Capability::Comment,
                Capability::TriageReports,
                Capability::ViewAuditLog,
                Capability::RecomputeRisk,
            ],
        }
    }

    /// Returns `true` if this role grants the given capability.
    #[must_use]
    pub fn allows(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// A stored incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Primary key.
    pub id: i64,
    /// Submitting user.
    pub user_id: i64,
    /// Short summary.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Optional human-readable address.
    pub address: Option<String>,
    /// Ward containing the coordinate, when one matched.
    pub ward_id: Option<i64>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Citizen-assigned severity.
    pub severity: ReportSeverity,
    /// Agency assigned by an authority.
    pub assigned_agency: Option<Agency>,
    /// Citizen-supplied photo path.
    pub image_path: Option<String>,
    /// Authority-supplied resolution photo path.
    pub resolution_image_path: Option<String>,
    /// Number of distinct users who upvoted.
    pub upvote_count: u32,
    /// Number of comments.
    pub comment_count: u32,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Set exactly when the status transitions into `Resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A validated citizen submission, before storage assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    /// Short summary.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Optional human-readable address.
    pub address: Option<String>,
    /// Citizen-assigned severity.
    pub severity: ReportSeverity,
    /// Citizen-supplied photo path.
    pub image_path: Option<String>,
}

impl NewReport {
    /// Validates field constraints before the submission reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field when the
    /// title or description is too short or long, or a coordinate is out
    /// of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title_len = self.title.trim().chars().count();
        if title_len < TITLE_MIN_LEN {
            return Err(ValidationError {
                field: "title",
                message: format!("must be at least {TITLE_MIN_LEN} characters"),
            });
        }
        if title_len > TITLE_MAX_LEN {
            return Err(ValidationError {
                field: "title",
                message: format!("must be at most {TITLE_MAX_LEN} characters"),
            });
        }
        if self.description.trim().chars().count() < DESCRIPTION_MIN_LEN {
            return Err(ValidationError {
                field: "description",
                message: format!("must be at least {DESCRIPTION_MIN_LEN} characters"),
            });
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError {
                field: "latitude",
                message: "must be within -90..90".to_string(),
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError {
                field: "longitude",
                message: "must be within -180..180".to_string(),
            });
        }
        Ok(())
    }
}

/// Field-level rejection of a malformed submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Name of the field that failed validation.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

/// A partial update applied by an authority actor.
///
/// Only supplied fields change; `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPatch {
    /// New lifecycle status.
    pub status: Option<ReportStatus>,
    /// New severity.
    pub severity: Option<ReportSeverity>,
    /// Agency to assign.
    pub assigned_agency: Option<Agency>,
    /// Free-text note recorded in the audit trail.
    pub notes: Option<String>,
}

impl ReportPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.severity.is_none()
            && self.assigned_agency.is_none()
            && self.notes.is_none()
    }
}

/// A comment attached to exactly one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Primary key.
    pub id: i64,
    /// Report the comment belongs to.
    pub report_id: i64,
    /// Commenting user.
    pub user_id: i64,
    /// Comment body.
    pub content: String,
    /// Creation time; comments are displayed in insertion order.
    pub created_at: DateTime<Utc>,
}

/// Kind of authority action recorded in the audit trail.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Lifecycle status change.
    StatusUpdate,
    /// Agency assignment.
    AgencyAssigned,
    /// Resolution evidence upload.
    ResolutionImageUploaded,
}

/// One entry in a report's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Primary key.
    pub id: i64,
    /// Report the entry belongs to.
    pub report_id: i64,
    /// Acting authority user.
    pub user_id: i64,
    /// What happened.
    pub action: AuditAction,
    /// Status before a status update.
    pub old_status: Option<ReportStatus>,
    /// Status after a status update.
    pub new_status: Option<ReportStatus>,
    /// Free-text note supplied with the action.
    pub notes: Option<String>,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewReport {
        NewReport {
            title: "Knee-deep water at ring road underpass".to_string(),
            description: "Water has not drained since last night's rain".to_string(),
            latitude: 28.61,
            longitude: 77.21,
            address: None,
            severity: ReportSeverity::High,
            image_path: None,
        }
    }

    #[test]
    fn accepts_valid_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let mut d = draft();
        d.latitude = 95.0;
        let err = d.validate().unwrap_err();
        assert_eq!(err.field, "latitude");
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        let mut d = draft();
        d.longitude = -180.5;
        assert_eq!(d.validate().unwrap_err().field, "longitude");
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut d = draft();
        d.latitude = f64::NAN;
        assert_eq!(d.validate().unwrap_err().field, "latitude");
    }

    #[test]
    fn rejects_short_title() {
        let mut d = draft();
        d.title = "Help".to_string();
        assert_eq!(d.validate().unwrap_err().field, "title");
    }

    #[test]
    fn rejects_short_description() {
        let mut d = draft();
        d.description = "flooded".to_string();
        assert_eq!(d.validate().unwrap_err().field, "description");
    }

    #[test]
    fn rejects_overlong_title() {
        let mut d = draft();
        d.title = "x".repeat(TITLE_MAX_LEN + 1);
        assert_eq!(d.validate().unwrap_err().field, "title");
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        use ReportStatus::{Closed, InProgress, Open, Resolved};

        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Resolved));
        assert!(Open.can_transition_to(Closed));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));

        assert!(!Resolved.can_transition_to(Open));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Closed.can_transition_to(Resolved));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn closed_counts_as_resolved() {
        assert!(ReportStatus::Resolved.counts_as_resolved());
        assert!(ReportStatus::Closed.counts_as_resolved());
        assert!(!ReportStatus::Open.counts_as_resolved());
        assert!(!ReportStatus::InProgress.counts_as_resolved());
    }

    #[test]
    fn citizens_cannot_triage() {
        assert!(UserRole::Citizen.allows(Capability::SubmitReport));
        assert!(UserRole::Citizen.allows(Capability::Upvote));
        assert!(!UserRole::Citizen.allows(Capability::TriageReports));
        assert!(!UserRole::Citizen.allows(Capability::RecomputeRisk));
    }

    #[test]
    fn authority_and_admin_can_triage() {
        assert!(UserRole::Authority.allows(Capability::TriageReports));
        assert!(UserRole::Admin.allows(Capability::ViewAuditLog));
        assert!(UserRole::Admin.allows(Capability::RecomputeRisk));
    }

    #[test]
    fn serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(serde_json::to_string(&Agency::Mcd).unwrap(), "\"MCD\"");
        assert_eq!(
            serde_json::to_string(&ReportSeverity::Critical).unwrap(),
            "\"CRITICAL\""
        );
    }
}
