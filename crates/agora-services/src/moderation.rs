//! # Moderation Service
//!
//! Report filing and resolution over the `ModerationRepo` port. The
//! polymorphic target is validated with a per-kind existence lookup at
//! filing time (strict referential choice); duplicate filings against the
//! same target are allowed — each report is an independent ticket.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{Report, ReportStatus, TargetKind, User};
use agora_core::traits::ModerationRepo;

use crate::sanitize::sanitize_text;

#[derive(Clone)]
pub struct ModerationService {
    repo: Arc<dyn ModerationRepo>,
}

impl ModerationService {
    pub fn new(repo: Arc<dyn ModerationRepo>) -> Self {
        Self { repo }
    }

    /// Files a report (status=open) against an existing post, thread, or
    /// user. A blank reason is recorded as "not specified" rather than
    /// rejected, so a report is never lost to a missing form field.
    pub async fn file_report(
        &self,
        kind: TargetKind,
        target_id: Uuid,
        reported_by: Uuid,
        reason: &str,
    ) -> Result<Report> {
        if !self.repo.target_exists(kind, target_id).await? {
            return Err(AppError::NotFound(
                kind.as_str().into(),
                target_id.to_string(),
            ));
        }

        let mut reason = sanitize_text(reason);
        if reason.is_empty() {
            reason = "not specified".into();
        }

        let report = Report {
            id: Uuid::now_v7(),
            target_type: kind,
            target_id,
            reported_by,
            reason,
            status: ReportStatus::Open,
            created_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
        };
        self.repo.insert_report(report.clone()).await?;
        tracing::info!(report_id = %report.id, target_kind = %kind, %target_id, "report filed");
        Ok(report)
    }

    /// Closes a report exactly once. The storage-level check-and-set makes
    /// two racing moderators resolve it a total of one time; the loser
    /// gets `AlreadyResolved` and the original resolution metadata stands.
    pub async fn resolve(&self, report_id: Uuid, resolver: &User) -> Result<Report> {
        self.repo
            .resolve_report(report_id, resolver.id, Utc::now())
            .await?;
        tracing::info!(%report_id, resolved_by = %resolver.id, "report resolved");
        self.repo
            .get_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("report".into(), report_id.to_string()))
    }

    pub async fn get_report(&self, id: Uuid) -> Result<Report> {
        self.repo
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound("report".into(), id.to_string()))
    }

    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        self.repo.list_reports(status).await
    }
}
