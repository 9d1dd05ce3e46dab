#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident store trait and in-memory implementation.
//!
//! The durable database behind report records is an external collaborator;
//! [`IncidentStore`] is the boundary the rest of the system programs
//! against. The bundled [`MemoryStore`] keeps everything behind one
//! `RwLock`, which gives the guarantees the aggregation pipeline needs for
//! free: snapshot reads never observe a partially-written record, and the
//! upvote check-and-insert is atomic per (user, report) pair.

pub mod memory;

use async_trait::async_trait;
pub use memory::MemoryStore;
use waterlog_map_analytics_models::ScoredWard;
use waterlog_map_geography_models::{Ward, WardBoundary};
use waterlog_map_report_models::{
    AuditEntry, Comment, NewReport, Report, ReportPatch, ReportSeverity, ReportStatus,
};

/// Errors surfaced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record ("report", "ward", ...).
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: i64,
    },

    /// A status update tried to move the lifecycle backwards.
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: ReportStatus,
        /// Requested status.
        to: ReportStatus,
    },
}

/// Maximum page size for report listings.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size for report listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Filters and pagination for report listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    /// Only reports with this status.
    pub status: Option<ReportStatus>,
    /// Only reports assigned to this ward.
    pub ward_id: Option<i64>,
    /// Only reports with this severity.
    pub severity: Option<ReportSeverity>,
    /// Page size; clamped to `1..=MAX_PAGE_SIZE`, 0 means default.
    pub limit: u32,
    /// Number of matching reports to skip.
    pub offset: u32,
}

impl ReportFilter {
    /// Effective page size after clamping.
    #[must_use]
    pub const fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else if self.limit > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.limit
        }
    }
}

/// One page of a report listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    /// Reports on this page, newest first.
    pub reports: Vec<Report>,
    /// Total matching reports across all pages.
    pub total: u64,
}

/// Boundary contract for report and ward persistence.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Stores a validated submission and returns the assigned record.
    ///
    /// The caller resolves the containing ward (spatial attribution is
    /// not the store's job) and performs validation beforehand.
    ///
    /// # Errors
    ///
    /// Implementations backed by fallible storage may fail; the in-memory
    /// store does not.
    async fn create_report(
        &self,
        user_id: i64,
        new: NewReport,
        ward_id: Option<i64>,
    ) -> Result<Report, StoreError>;

    /// Fetches one report.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id does not resolve.
    async fn report(&self, id: i64) -> Result<Report, StoreError>;

    /// Lists reports newest-first with filters and pagination.
    ///
    /// # Errors
    ///
    /// Implementations backed by fallible storage may fail.
    async fn reports(&self, filter: &ReportFilter) -> Result<ReportPage, StoreError>;

    /// Returns a consistent snapshot of every report for aggregation.
    async fn snapshot(&self) -> Vec<Report>;

    /// Records an upvote exactly once per (user, report) pair.
    ///
    /// Returns `true` when the vote was newly recorded, `false` when the
    /// pair had already voted; the count never increments twice.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist.
    async fn upvote(&self, report_id: i64, user_id: i64) -> Result<bool, StoreError>;

    /// Appends a comment and bumps the report's comment count.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist.
    async fn add_comment(
        &self,
        report_id: i64,
        user_id: i64,
        content: String,
    ) -> Result<Comment, StoreError>;

    /// Lists a report's comments in insertion order.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist.
    async fn comments(&self, report_id: i64) -> Result<Vec<Comment>, StoreError>;

    /// Applies an authority patch; only supplied fields change.
    ///
    /// Status changes go through the forward-only lifecycle; entering
    /// `RESOLVED` records the resolution timestamp. Every change appends
    /// an audit entry attributed to `actor_id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist,
    /// [`StoreError::InvalidTransition`] when the patch moves the
    /// lifecycle backwards.
    async fn update_report(
        &self,
        report_id: i64,
        patch: ReportPatch,
        actor_id: i64,
    ) -> Result<Report, StoreError>;

    /// Attaches a resolution image path and records the audit entry.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist.
    async fn set_resolution_image(
        &self,
        report_id: i64,
        path: String,
        actor_id: i64,
    ) -> Result<Report, StoreError>;

    /// Lists a report's audit trail, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the report does not exist.
    async fn audit_log(&self, report_id: i64) -> Result<Vec<AuditEntry>, StoreError>;

    /// Lists all ward records.
    async fn wards(&self) -> Vec<Ward>;

    /// Fetches one ward record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id does not resolve.
    async fn ward(&self, id: i64) -> Result<Ward, StoreError>;

    /// Registers ward records for loaded boundaries, upserting by ward
    /// number. Returns the registered records in input order.
    async fn register_wards(&self, boundaries: &[WardBoundary]) -> Vec<Ward>;

    /// Atomically publishes the results of an aggregation pass.
    ///
    /// Either every score in the batch becomes visible or none does; an
    /// abandoned pass that never calls this publishes nothing.
    async fn publish_ward_scores(&self, scores: Vec<ScoredWard>);
}
