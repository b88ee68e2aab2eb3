use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::report::DbReport;
use crate::models::user::DbUser;

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 is what we write (e.g. 2025-11-19T12:34:56.000000Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite default timestamp format: "YYYY-MM-DD HH:MM:SS" (with optional fractional seconds)
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| AppError::internal(format!("invalid date {s}: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn column<T>(row: &SqliteRow, name: &str) -> Result<T, AppError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| AppError::internal(format!("missing {name}: {e}")))
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    let id: String = column(row, "id")?;
    let role: String = column(row, "role")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;

    Ok(DbUser {
        id: parse_uuid(&id)?,
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        role: role.parse().map_err(|_| AppError::internal(format!("invalid role: {role}")))?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Parse a `reports` row joined with its owner (`owner_*` columns).
pub fn db_report_from_row(row: &SqliteRow) -> Result<DbReport, AppError> {
    let id: String = column(row, "id")?;
    let user_id: String = column(row, "user_id")?;
    let status: String = column(row, "status")?;
    let date: String = column(row, "date")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;
    let owner_role: String = column(row, "owner_role")?;

    Ok(DbReport {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        file_path: column(row, "file_path")?,
        notes: column(row, "notes")?,
        status: status.parse().map_err(|_| AppError::internal(format!("invalid status: {status}")))?,
        date: parse_date(&date)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        owner_email: column(row, "owner_email")?,
        owner_first_name: column(row, "owner_first_name")?,
        owner_last_name: column(row, "owner_last_name")?,
        owner_role: owner_role.parse().map_err(|_| AppError::internal(format!("invalid role: {owner_role}")))?,
    })
}
