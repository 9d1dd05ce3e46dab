//! In-memory [`IncidentStore`] implementation.
//!
//! All state sits behind a single `tokio` `RwLock`. Write operations take
//! the write lock for the whole check-and-mutate sequence, so the upvote
//! uniqueness check and the lifecycle transition check are atomic;
//! [`MemoryStore::snapshot`] clones under the read lock, so aggregation
//! never observes a half-applied update.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use waterlog_map_analytics_models::ScoredWard;
use waterlog_map_geography_models::{Ward, WardBoundary};
use waterlog_map_report_models::{
    AuditAction, AuditEntry, Comment, NewReport, Report, ReportPatch, ReportStatus,
};

use crate::{IncidentStore, ReportFilter, ReportPage, StoreError};

#[derive(Default)]
struct State {
    reports: BTreeMap<i64, Report>,
    comments: BTreeMap<i64, Vec<Comment>>,
    upvotes: BTreeSet<(i64, i64)>,
    audit: Vec<AuditEntry>,
    wards: BTreeMap<i64, Ward>,
    ward_ids_by_number: BTreeMap<String, i64>,
    next_report_id: i64,
    next_comment_id: i64,
    next_audit_id: i64,
    next_ward_id: i64,
}

impl State {
    fn report_mut(&mut self, id: i64) -> Result<&mut Report, StoreError> {
        self.reports.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "report",
            id,
        })
    }

    fn ensure_report(&self, id: i64) -> Result<(), StoreError> {
        if self.reports.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "report",
                id,
            })
        }
    }

    fn push_audit(
        &mut self,
        report_id: i64,
        user_id: i64,
        action: AuditAction,
        old_status: Option<ReportStatus>,
        new_status: Option<ReportStatus>,
        notes: Option<String>,
    ) {
        self.next_audit_id += 1;
        self.audit.push(AuditEntry {
            id: self.next_audit_id,
            report_id,
            user_id,
            action,
            old_status,
            new_status,
            notes,
            created_at: Utc::now(),
        });
    }
}

/// In-memory store; cheap to construct, shared via `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn create_report(
        &self,
        user_id: i64,
        new: NewReport,
        ward_id: Option<i64>,
    ) -> Result<Report, StoreError> {
        let mut state = self.state.write().await;
        state.next_report_id += 1;

        let report = Report {
            id: state.next_report_id,
            user_id,
            title: new.title,
            description: new.description,
            latitude: new.latitude,
            longitude: new.longitude,
            address: new.address,
            ward_id,
            status: ReportStatus::Open,
            severity: new.severity,
            assigned_agency: None,
            image_path: new.image_path,
            resolution_image_path: None,
            upvote_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
            updated_at: None,
            resolved_at: None,
        };

        state.reports.insert(report.id, report.clone());
        log::debug!("Created report {} in ward {ward_id:?}", report.id);
        Ok(report)
    }

    async fn report(&self, id: i64) -> Result<Report, StoreError> {
        let state = self.state.read().await;
        state.reports.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "report",
            id,
        })
    }

    async fn reports(&self, filter: &ReportFilter) -> Result<ReportPage, StoreError> {
        let state = self.state.read().await;

        let mut matching: Vec<&Report> = state
            .reports
            .values()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.ward_id.is_none_or(|w| r.ward_id == Some(w)))
            .filter(|r| filter.severity.is_none_or(|s| r.severity == s))
            .collect();

        // Newest first; ids are monotone so they tiebreak equal timestamps.
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matching.len() as u64;
        let reports = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.effective_limit() as usize)
            .cloned()
            .collect();

        Ok(ReportPage { reports, total })
    }

    async fn snapshot(&self) -> Vec<Report> {
        let state = self.state.read().await;
        state.reports.values().cloned().collect()
    }

    async fn upvote(&self, report_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_report(report_id)?;

        if !state.upvotes.insert((report_id, user_id)) {
            return Ok(false);
        }

        let report = state.report_mut(report_id)?;
        report.upvote_count += 1;
        report.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn add_comment(
        &self,
        report_id: i64,
        user_id: i64,
        content: String,
    ) -> Result<Comment, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_report(report_id)?;

        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            report_id,
            user_id,
            content,
            created_at: Utc::now(),
        };

        state
            .comments
            .entry(report_id)
            .or_default()
            .push(comment.clone());

        let report = state.report_mut(report_id)?;
        report.comment_count += 1;
        report.updated_at = Some(Utc::now());
        Ok(comment)
    }

    async fn comments(&self, report_id: i64) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.read().await;
        state.ensure_report(report_id)?;
        Ok(state.comments.get(&report_id).cloned().unwrap_or_default())
    }

    async fn update_report(
        &self,
        report_id: i64,
        patch: ReportPatch,
        actor_id: i64,
    ) -> Result<Report, StoreError> {
        let mut state = self.state.write().await;

        let current_status = state.report_mut(report_id)?.status;

        if let Some(next) = patch.status {
            if !current_status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    from: current_status,
                    to: next,
                });
            }
        }

        let now = Utc::now();

        if let Some(next) = patch.status {
            let report = state.report_mut(report_id)?;
            report.status = next;
            if next == ReportStatus::Resolved {
                report.resolved_at = Some(now);
            }
            state.push_audit(
                report_id,
                actor_id,
                AuditAction::StatusUpdate,
                Some(current_status),
                Some(next),
                patch.notes.clone(),
            );
        }

        if let Some(severity) = patch.severity {
            state.report_mut(report_id)?.severity = severity;
        }

        if let Some(agency) = patch.assigned_agency {
            state.report_mut(report_id)?.assigned_agency = Some(agency);
            state.push_audit(
                report_id,
                actor_id,
                AuditAction::AgencyAssigned,
                None,
                None,
                patch.notes.clone(),
            );
        }

        let report = state.report_mut(report_id)?;
        report.updated_at = Some(now);
        Ok(report.clone())
    }

    async fn set_resolution_image(
        &self,
        report_id: i64,
        path: String,
        actor_id: i64,
    ) -> Result<Report, StoreError> {
        let mut state = self.state.write().await;

        let report = state.report_mut(report_id)?;
        report.resolution_image_path = Some(path);
        report.updated_at = Some(Utc::now());
        let updated = report.clone();

        state.push_audit(
            report_id,
            actor_id,
            AuditAction::ResolutionImageUploaded,
            None,
            None,
            None,
        );
        Ok(updated)
    }

    async fn audit_log(&self, report_id: i64) -> Result<Vec<AuditEntry>, StoreError> {
        let state = self.state.read().await;
        state.ensure_report(report_id)?;

        let mut entries: Vec<AuditEntry> = state
            .audit
            .iter()
            .filter(|e| e.report_id == report_id)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn wards(&self) -> Vec<Ward> {
        let state = self.state.read().await;
        state.wards.values().cloned().collect()
    }

    async fn ward(&self, id: i64) -> Result<Ward, StoreError> {
        let state = self.state.read().await;
        state
            .wards
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "ward", id })
    }

    async fn register_wards(&self, boundaries: &[WardBoundary]) -> Vec<Ward> {
        let mut state = self.state.write().await;
        let mut registered = Vec::with_capacity(boundaries.len());

        for boundary in boundaries {
            let existing = state.ward_ids_by_number.get(&boundary.ward_number).copied();
            let id = if let Some(id) = existing {
                let ward = state
                    .wards
                    .get_mut(&id)
                    .expect("ward id registered without a record");
                ward.ward_name.clone_from(&boundary.ward_name);
                id
            } else {
                state.next_ward_id += 1;
                let id = state.next_ward_id;
                state
                    .ward_ids_by_number
                    .insert(boundary.ward_number.clone(), id);
                state.wards.insert(
                    id,
                    Ward::new(id, boundary.ward_number.clone(), boundary.ward_name.clone()),
                );
                id
            };
            registered.push(state.wards[&id].clone());
        }

        registered
    }

    async fn publish_ward_scores(&self, scores: Vec<ScoredWard>) {
        let mut state = self.state.write().await;
        let mut applied = 0_usize;

        for score in &scores {
            if let Some(ward) = state.wards.get_mut(&score.ward_id) {
                ward.risk_score = score.risk_score;
                ward.incident_density = score.incident_density;
                ward.elevation_avg = score.elevation_avg;
                ward.slope_avg = score.slope_avg;
                applied += 1;
            } else {
                log::warn!("Dropping score for unknown ward {}", score.ward_id);
            }
        }

        log::info!("Published risk scores for {applied} wards");
    }
}
