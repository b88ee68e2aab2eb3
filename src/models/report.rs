use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::{Loggable, Severity};
use crate::models::user::Role;
use crate::pagination::PageRequest;

// =============================================================================
// STATUS
// =============================================================================

/// Review status of a report.
///
/// `Submitted` is the initial state. `Reviewed` and `Rejected` are terminal.
/// `Rejected` is a valid stored value but no operation moves a report into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ReportStatus {
    Submitted,
    Reviewed,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "Submitted",
            ReportStatus::Reviewed => "Reviewed",
            ReportStatus::Rejected => "Rejected",
        }
    }

    /// Statuses a manager may request through the status update operation.
    pub fn is_assignable(&self) -> bool {
        matches!(self, ReportStatus::Submitted | ReportStatus::Reviewed)
    }

    /// Re-applying the current status is allowed; nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        match (self, next) {
            (current, next) if *current == next => true,
            (ReportStatus::Submitted, ReportStatus::Reviewed) => true,
            _ => false,
        }
    }

    /// Parse a requested target status and check it against the current one.
    pub fn transition(&self, requested: &str) -> Result<ReportStatus, AppError> {
        let next: ReportStatus = requested
            .parse()
            .map_err(|_| AppError::bad_request("invalid status provided"))?;

        if !next.is_assignable() {
            return Err(AppError::bad_request("invalid status provided"));
        }
        if !self.can_transition_to(next) {
            return Err(AppError::bad_request(format!(
                "cannot change status from {} to {}",
                self, next
            )));
        }

        Ok(next)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(ReportStatus::Submitted),
            "Reviewed" => Ok(ReportStatus::Reviewed),
            "Rejected" => Ok(ReportStatus::Rejected),
            other => Err(AppError::bad_request(format!("unknown status: {other}"))),
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// Public profile of the identity that owns a report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportOwner {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// A report joined with its owner's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Storage reference of the uploaded file.
    #[schema(example = "1718000000000-3f2a9c.pdf")]
    pub file_path: String,
    pub notes: Option<String>,
    pub status: ReportStatus,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ReportOwner,
}

impl Loggable for Report {
    fn entity_type() -> &'static str { "report" }
    fn subject_id(&self) -> Uuid { self.id }

    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" | "status_changed" => Severity::Critical,
            _ => self.severity(),
        }
    }
}

/// Row shape of `reports` joined with `users`.
#[derive(Debug, Clone)]
pub struct DbReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_path: String,
    pub notes: Option<String>,
    pub status: ReportStatus,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_role: Role,
}

impl From<DbReport> for Report {
    fn from(value: DbReport) -> Self {
        Report {
            id: value.id,
            user_id: value.user_id,
            file_path: value.file_path,
            notes: value.notes,
            status: value.status,
            date: value.date,
            created_at: value.created_at,
            updated_at: value.updated_at,
            user: ReportOwner {
                id: value.user_id,
                email: value.owner_email,
                first_name: value.owner_first_name,
                last_name: value.owner_last_name,
                role: value.owner_role,
            },
        }
    }
}

/// Metadata for a new report. The owner is never part of it: it is always the
/// acting identity.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub file_path: String,
    pub notes: Option<String>,
}

/// Multipart body accepted by the upload endpoint. Documentation only.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ReportUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(example = "Weekly summary")]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NotesUpdateRequest {
    /// Replaces the stored notes. `null` or absent clears them.
    #[serde(default)]
    #[schema(example = "Added Q3 numbers")]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    #[schema(example = "Reviewed")]
    pub status: Option<String>,
}

// =============================================================================
// LISTING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Date,
    Status,
    Notes,
    FilePath,
    Id,
    UserId,
    /// Owner's first name, then last name.
    Employee,
}

impl SortKey {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "createdAt" => Ok(SortKey::CreatedAt),
            "updatedAt" => Ok(SortKey::UpdatedAt),
            "date" => Ok(SortKey::Date),
            "status" => Ok(SortKey::Status),
            "notes" => Ok(SortKey::Notes),
            "filePath" => Ok(SortKey::FilePath),
            "id" => Ok(SortKey::Id),
            "userId" => Ok(SortKey::UserId),
            "employee" => Ok(SortKey::Employee),
            other => Err(AppError::bad_request(format!("cannot sort by {other}"))),
        }
    }

    /// Qualified columns this key orders by.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SortKey::CreatedAt => &["r.created_at"],
            SortKey::UpdatedAt => &["r.updated_at"],
            SortKey::Date => &["r.date"],
            SortKey::Status => &["r.status"],
            SortKey::Notes => &["r.notes"],
            SortKey::FilePath => &["r.file_path"],
            SortKey::Id => &["r.id"],
            SortKey::UserId => &["r.user_id"],
            SortKey::Employee => &["u.first_name", "u.last_name"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::bad_request("sortOrder must be asc or desc")),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for ReportSort {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl ReportSort {
    /// `ORDER BY` body. Report id breaks ties so pages never overlap.
    pub fn to_sql(&self) -> String {
        let dir = self.order.as_sql();
        let mut parts: Vec<String> = self
            .key
            .columns()
            .iter()
            .map(|col| format!("{col} {dir}"))
            .collect();
        if self.key != SortKey::Id {
            parts.push("r.id ASC".to_string());
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    /// Inclusive lower bound on the creation timestamp.
    pub created_since: Option<DateTime<Utc>>,
    pub status: Option<ReportStatus>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: ReportFilters,
    pub page: PageRequest,
    pub sort: ReportSort,
}

/// Raw query string of the listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    /// 1-based page number
    pub page: Option<String>,
    /// Page size, defaults to 10
    pub size: Option<String>,
    /// createdAt, updatedAt, date, status, notes, filePath, id, userId or employee
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    /// Only reports created on or after this date (YYYY-MM-DD or RFC 3339)
    pub date: Option<String>,
    /// Submitted, Reviewed or Rejected
    pub status: Option<String>,
    /// Owner id
    pub user_id: Option<String>,
}

impl ReportListQuery {
    pub fn into_options(self) -> Result<ListOptions, AppError> {
        let page = PageRequest::parse(self.page.as_deref(), self.size.as_deref())?;

        let created_since = non_blank(self.date.as_deref()).map(parse_date_bound).transpose()?;
        let status = non_blank(self.status.as_deref())
            .map(|raw| raw.parse::<ReportStatus>())
            .transpose()?;

        let key = non_blank(self.sort_by.as_deref())
            .map(SortKey::parse)
            .transpose()?
            .unwrap_or(SortKey::CreatedAt);
        let order = non_blank(self.sort_order.as_deref())
            .map(SortOrder::parse)
            .transpose()?
            .unwrap_or(SortOrder::Desc);

        let owner_id = non_blank(self.user_id.as_deref())
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("invalid userId: {raw}")))
            })
            .transpose()?;

        Ok(ListOptions {
            filters: ReportFilters {
                created_since,
                status,
                owner_id,
            },
            page,
            sort: ReportSort { key, order },
        })
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| AppError::bad_request(format!("invalid date filter: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_can_be_reviewed() {
        let next = ReportStatus::Submitted.transition("Reviewed").unwrap();
        assert_eq!(next, ReportStatus::Reviewed);
    }

    #[test]
    fn same_status_is_idempotent() {
        assert_eq!(ReportStatus::Submitted.transition("Submitted").unwrap(), ReportStatus::Submitted);
        assert_eq!(ReportStatus::Reviewed.transition("Reviewed").unwrap(), ReportStatus::Reviewed);
    }

    #[test]
    fn rejected_is_never_assignable() {
        assert!(ReportStatus::Submitted.transition("Rejected").is_err());
        assert!(!ReportStatus::Rejected.is_assignable());
    }

    #[test]
    fn terminal_states_do_not_move() {
        assert!(ReportStatus::Reviewed.transition("Submitted").is_err());
        assert!(ReportStatus::Rejected.transition("Submitted").is_err());
        assert!(ReportStatus::Rejected.transition("Reviewed").is_err());
    }

    #[test]
    fn unknown_or_miscased_status_is_invalid() {
        assert!(ReportStatus::Submitted.transition("reviewed").is_err());
        assert!(ReportStatus::Submitted.transition("Approved").is_err());
        assert!(ReportStatus::Submitted.transition("").is_err());
    }

    #[test]
    fn empty_query_uses_defaults() {
        let opts = ReportListQuery::default().into_options().unwrap();
        assert_eq!(opts.sort, ReportSort::default());
        assert_eq!(opts.filters, ReportFilters::default());
        assert_eq!(opts.page.limit(), 10);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let query = ReportListQuery {
            date: Some("  ".into()),
            status: Some(String::new()),
            ..Default::default()
        };
        let opts = query.into_options().unwrap();
        assert_eq!(opts.filters, ReportFilters::default());
    }

    #[test]
    fn date_filter_accepts_plain_dates() {
        let query = ReportListQuery {
            date: Some("2024-03-01".into()),
            ..Default::default()
        };
        let opts = query.into_options().unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(opts.filters.created_since, Some(expected));
    }

    #[test]
    fn bad_filters_are_validation_errors() {
        for query in [
            ReportListQuery { date: Some("yesterday".into()), ..Default::default() },
            ReportListQuery { status: Some("Done".into()), ..Default::default() },
            ReportListQuery { sort_by: Some("password_hash".into()), ..Default::default() },
            ReportListQuery { sort_order: Some("sideways".into()), ..Default::default() },
            ReportListQuery { user_id: Some("42".into()), ..Default::default() },
        ] {
            assert!(matches!(query.into_options(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn employee_sort_orders_by_owner_name() {
        let sort = ReportSort { key: SortKey::Employee, order: SortOrder::Asc };
        assert_eq!(sort.to_sql(), "u.first_name ASC, u.last_name ASC, r.id ASC");
    }

    #[test]
    fn default_sort_is_newest_first() {
        assert_eq!(ReportSort::default().to_sql(), "r.created_at DESC, r.id ASC");
    }
}
