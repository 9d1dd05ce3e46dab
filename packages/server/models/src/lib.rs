#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the waterlog map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store record types so the API contract can evolve
//! independently; field names stay snake_case because the map frontend
//! and the `GeoJSON` property keys share that convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waterlog_map_analytics_models::{RiskCategory, WardAnalytics};
use waterlog_map_geography_models::Ward;
use waterlog_map_report_models::{
    Agency, Comment, Report, ReportPatch, ReportSeverity, ReportStatus,
};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body for every failure response.
///
/// `field` is set for validation failures so the caller can highlight
/// the offending input.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
    /// Offending field for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// Builds a plain error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }

    /// Builds a field-level validation error body.
    #[must_use]
    pub fn for_field(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}

/// An incident report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReport {
    /// Unique report id.
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
    /// Optional address.
    pub address: Option<String>,
    /// Assigned ward, when the coordinate matched one.
    pub ward_id: Option<i64>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Severity.
    pub severity: ReportSeverity,
    /// Assigned agency.
    pub assigned_agency: Option<Agency>,
    /// Citizen photo path.
    pub image_path: Option<String>,
    /// Resolution photo path.
    pub resolution_image_path: Option<String>,
    /// Upvote count.
    pub upvote_count: u32,
    /// Comment count.
    pub comment_count: u32,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            user_id: report.user_id,
            title: report.title,
            description: report.description,
            latitude: report.latitude,
            longitude: report.longitude,
            address: report.address,
            ward_id: report.ward_id,
            status: report.status,
            severity: report.severity,
            assigned_agency: report.assigned_agency,
            image_path: report.image_path,
            resolution_image_path: report.resolution_image_path,
            upvote_count: report.upvote_count,
            comment_count: report.comment_count,
            created_at: report.created_at,
            updated_at: report.updated_at,
            resolved_at: report.resolved_at,
        }
    }
}

/// Body for `POST /reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportRequest {
    /// Short summary.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Optional address.
    pub address: Option<String>,
    /// Severity; defaults to `MEDIUM` when omitted.
    pub severity: Option<ReportSeverity>,
}

/// Body for `PUT /authority/reports/{id}`. Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReportRequest {
    /// New lifecycle status.
    pub status: Option<ReportStatus>,
    /// New severity.
    pub severity: Option<ReportSeverity>,
    /// Agency to assign.
    pub assigned_agency: Option<Agency>,
    /// Audit note.
    pub notes: Option<String>,
}

impl From<UpdateReportRequest> for ReportPatch {
    fn from(request: UpdateReportRequest) -> Self {
        Self {
            status: request.status,
            severity: request.severity,
            assigned_agency: request.assigned_agency,
            notes: request.notes,
        }
    }
}

/// One page of `GET /reports`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportListResponse {
    /// Reports on this page, newest first.
    pub reports: Vec<ApiReport>,
    /// Total matching reports.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Effective page size.
    pub page_size: u32,
}

/// Query parameters for `GET /reports`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQueryParams {
    /// Filter by status.
    pub status: Option<ReportStatus>,
    /// Filter by ward.
    pub ward_id: Option<i64>,
    /// Filter by severity.
    pub severity: Option<ReportSeverity>,
    /// Page size (1-100).
    pub limit: Option<u32>,
    /// Number of reports to skip.
    pub offset: Option<u32>,
}

/// Query parameters for `GET /analytics/reports-geojson`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportGeoJsonParams {
    /// Filter by status.
    pub status: Option<ReportStatus>,
}

/// Response for `POST /reports/{id}/upvote`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpvoteResponse {
    /// Outcome message.
    pub message: String,
    /// `true` when this user had already upvoted the report.
    pub already_upvoted: bool,
}

/// Body for `POST /reports/{id}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    /// Comment body.
    pub content: String,
}

/// A comment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiComment {
    /// Unique comment id.
    pub id: i64,
    /// Report the comment belongs to.
    pub report_id: i64,
    /// Commenting user.
    pub user_id: i64,
    /// Comment body.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for ApiComment {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            report_id: comment.report_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

/// A ward record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiWard {
    /// Unique ward id.
    pub id: i64,
    /// Official ward number.
    pub ward_number: String,
    /// Ward name.
    pub ward_name: String,
    /// Risk score in `[0, 100]`.
    pub risk_score: f64,
    /// Average elevation in meters.
    pub elevation_avg: Option<f64>,
    /// Average slope in degrees.
    pub slope_avg: Option<f64>,
    /// Incidents per km².
    pub incident_density: f64,
}

impl From<Ward> for ApiWard {
    fn from(ward: Ward) -> Self {
        Self {
            id: ward.id,
            ward_number: ward.ward_number,
            ward_name: ward.ward_name,
            risk_score: ward.risk_score,
            elevation_avg: ward.elevation_avg,
            slope_avg: ward.slope_avg,
            incident_density: ward.incident_density,
        }
    }
}

/// The ward analytics aggregate as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiWardAnalytics {
    /// The ward record.
    pub ward: ApiWard,
    /// Risk band for the ward's current score.
    pub risk_category: RiskCategory,
    /// Fixed preparedness advisory for the band.
    pub recommendation: String,
    /// All reports assigned to the ward.
    pub total_reports: u64,
    /// Reports still open.
    pub open_reports: u64,
    /// Reports resolved or closed.
    pub resolved_reports: u64,
    /// Mean hours from creation to resolution.
    pub avg_resolution_time_hours: Option<f64>,
}

impl From<WardAnalytics> for ApiWardAnalytics {
    fn from(analytics: WardAnalytics) -> Self {
        let category = RiskCategory::from_score(analytics.ward.risk_score);
        Self {
            ward: analytics.ward.into(),
            risk_category: category,
            recommendation: category.recommendation().to_string(),
            total_reports: analytics.total_reports,
            open_reports: analytics.open_reports,
            resolved_reports: analytics.resolved_reports,
            avg_resolution_time_hours: analytics.avg_resolution_time_hours,
        }
    }
}

/// Query parameters for `POST /authority/reports/{id}/resolution-image`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionImageParams {
    /// Original filename; only its extension is used.
    pub filename: String,
}

/// Query parameters for `POST /authority/recompute`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecomputeParams {
    /// When `true`, fetch fresh terrain statistics for every ward.
    pub terrain: Option<bool>,
}

/// Response for `POST /authority/recompute`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecomputeResponse {
    /// Number of wards scored and published.
    pub wards_scored: usize,
}
