//! Report lifecycle.
//!
//! Every operation resolves its target first (`NotFound`), then asks the
//! policy (`Forbidden`), validates input, and only then writes. A failed
//! operation leaves the stored report untouched.

use std::sync::Arc;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{ensure, Action, PolicyEvaluator, Principal, ResourceContext};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus};
use crate::models::report::{ListOptions, NewReport, Report};
use crate::pagination::Page;

#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
    events: EventBus,
}

impl ReportService {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>, events: EventBus) -> Self {
        Self { pool, policy, events }
    }

    /// Create a report owned by `actor`, in `Submitted` state, dated today.
    pub async fn create(&self, actor: &Principal, input: NewReport) -> AppResult<Report> {
        ensure(self.policy.as_ref(), actor, Action::CreateReport, &ResourceContext::new())?;

        if input.file_path.trim().is_empty() {
            return Err(AppError::bad_request("file is required"));
        }

        let report_id =
            db::reports::insert(&self.pool, actor.user_id, &input.file_path, input.notes.as_deref()).await?;
        let report = self.resolve(report_id).await?;

        tracing::info!(report_id = %report.id, owner_id = %report.user_id, "report created");
        log_activity(&self.events, "created", Some(actor.user_id), &report, None);

        Ok(report)
    }

    pub async fn get(&self, actor: &Principal, report_id: Uuid) -> AppResult<Report> {
        let report = self.resolve(report_id).await?;
        ensure(self.policy.as_ref(), actor, Action::ViewReport, &context_of(&report))?;
        Ok(report)
    }

    /// Every report matching the filters, whoever owns it.
    pub async fn list_all(&self, actor: &Principal, options: ListOptions) -> AppResult<Page<Report>> {
        ensure(self.policy.as_ref(), actor, Action::ListAllReports, &ResourceContext::new())?;
        self.list(options).await
    }

    /// The actor's own reports. Any owner filter in `options` is replaced.
    pub async fn list_mine(&self, actor: &Principal, mut options: ListOptions) -> AppResult<Page<Report>> {
        let ctx = ResourceContext {
            resource_id: None,
            owner_id: Some(actor.user_id),
        };
        ensure(self.policy.as_ref(), actor, Action::ListOwnReports, &ctx)?;

        options.filters.owner_id = Some(actor.user_id);
        self.list(options).await
    }

    /// Replace the notes verbatim. `None` clears them.
    pub async fn update_notes(&self, actor: &Principal, report_id: Uuid, notes: Option<String>) -> AppResult<Report> {
        let before = self.resolve(report_id).await?;
        ensure(self.policy.as_ref(), actor, Action::UpdateNotes, &context_of(&before))?;

        if !db::reports::update_notes(&self.pool, report_id, notes.as_deref()).await? {
            return Err(AppError::not_found("report not found"));
        }
        let after = self.resolve(report_id).await?;

        log_activity(&self.events, "updated", Some(actor.user_id), &after, Some(&before));
        Ok(after)
    }

    /// Move a report to `requested`. Managers only; see `ReportStatus::transition`.
    pub async fn update_status(&self, actor: &Principal, report_id: Uuid, requested: Option<&str>) -> AppResult<Report> {
        let before = self.resolve(report_id).await?;
        ensure(self.policy.as_ref(), actor, Action::UpdateStatus, &context_of(&before))?;

        let requested = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::bad_request("invalid status provided"))?;
        let next = before.status.transition(requested)?;

        if next == before.status {
            return Ok(before);
        }

        if !db::reports::update_status(&self.pool, report_id, next).await? {
            return Err(AppError::not_found("report not found"));
        }
        let after = self.resolve(report_id).await?;

        tracing::info!(report_id = %report_id, from = %before.status, to = %next, "report status changed");
        log_activity(&self.events, "status_changed", Some(actor.user_id), &after, Some(&before));
        Ok(after)
    }

    /// Remove the record. The stored file is left where it is.
    pub async fn delete(&self, actor: &Principal, report_id: Uuid) -> AppResult<()> {
        let report = self.resolve(report_id).await?;
        ensure(self.policy.as_ref(), actor, Action::DeleteReport, &context_of(&report))?;

        if !db::reports::delete(&self.pool, report_id).await? {
            return Err(AppError::not_found("report not found"));
        }

        tracing::info!(report_id = %report_id, file = %report.file_path, "report deleted");
        log_activity(&self.events, "deleted", Some(actor.user_id), &report, None);
        Ok(())
    }

    /// Check that `actor` may fetch the file behind `file_path`.
    ///
    /// Files no report points at any more are reported as missing.
    pub async fn authorize_download(&self, actor: &Principal, file_path: &str) -> AppResult<()> {
        let report: Report = db::reports::find_by_file(&self.pool, file_path)
            .await?
            .ok_or_else(|| AppError::not_found("file not found"))?
            .into();

        ensure(self.policy.as_ref(), actor, Action::DownloadFile, &context_of(&report))
    }

    async fn resolve(&self, report_id: Uuid) -> AppResult<Report> {
        db::reports::find(&self.pool, report_id)
            .await?
            .map(Report::from)
            .ok_or_else(|| AppError::not_found("report not found"))
    }

    async fn list(&self, options: ListOptions) -> AppResult<Page<Report>> {
        let (rows, total) = db::reports::list(&self.pool, &options.filters, &options.sort, &options.page).await?;
        let reports = rows.into_iter().map(Report::from).collect();
        Ok(Page::new(reports, total, &options.page))
    }
}

fn context_of(report: &Report) -> ResourceContext {
    ResourceContext::report(report.id, report.user_id)
}
