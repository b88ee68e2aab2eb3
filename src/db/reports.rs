use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppResult;
use crate::models::report::{DbReport, ReportFilters, ReportSort, ReportStatus};
use crate::pagination::PageRequest;
use crate::utils::{date_text, timestamp_text, utc_now};

const REPORT_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.file_path, r.notes, r.status, r.date, r.created_at, r.updated_at,
           u.email AS owner_email, u.first_name AS owner_first_name,
           u.last_name AS owner_last_name, u.role AS owner_role
    FROM reports r
    INNER JOIN users u ON u.id = r.user_id
"#;

pub async fn insert(pool: &SqlitePool, owner_id: Uuid, file_path: &str, notes: Option<&str>) -> AppResult<Uuid> {
    let report_id = Uuid::new_v4();
    let now = utc_now();
    let stamp = timestamp_text(now);

    sqlx::query(
        "INSERT INTO reports (id, user_id, file_path, notes, status, date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(report_id.to_string())
    .bind(owner_id.to_string())
    .bind(file_path)
    .bind(notes)
    .bind(ReportStatus::Submitted.as_str())
    .bind(date_text(now.date_naive()))
    .bind(&stamp)
    .bind(&stamp)
    .execute(pool)
    .await?;

    Ok(report_id)
}

pub async fn find(pool: &SqlitePool, report_id: Uuid) -> AppResult<Option<DbReport>> {
    let sql = format!("{REPORT_SELECT} WHERE r.id = ?");
    let row = sqlx::query(&sql)
        .bind(report_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_parsers::db_report_from_row).transpose()
}

pub async fn find_by_file(pool: &SqlitePool, file_path: &str) -> AppResult<Option<DbReport>> {
    let sql = format!("{REPORT_SELECT} WHERE r.file_path = ? ORDER BY r.created_at ASC LIMIT 1");
    let row = sqlx::query(&sql).bind(file_path).fetch_optional(pool).await?;

    row.as_ref().map(row_parsers::db_report_from_row).transpose()
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &ReportFilters) {
    builder.push(" WHERE 1 = 1");
    if let Some(since) = filters.created_since {
        builder.push(" AND r.created_at >= ").push_bind(timestamp_text(since));
    }
    if let Some(status) = filters.status {
        builder.push(" AND r.status = ").push_bind(status.as_str());
    }
    if let Some(owner_id) = filters.owner_id {
        builder.push(" AND r.user_id = ").push_bind(owner_id.to_string());
    }
}

/// One page of matching reports plus the total number of matches.
pub async fn list(
    pool: &SqlitePool,
    filters: &ReportFilters,
    sort: &ReportSort,
    page: &PageRequest,
) -> AppResult<(Vec<DbReport>, u64)> {
    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(1) FROM reports r INNER JOIN users u ON u.id = r.user_id");
    push_filters(&mut count_query, filters);
    let total = count_query.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(REPORT_SELECT);
    push_filters(&mut query, filters);
    // Sort columns come from a fixed whitelist, never from user input.
    query.push(" ORDER BY ").push(sort.to_sql());
    query
        .push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

    let rows = query.build().fetch_all(pool).await?;
    let reports = rows
        .iter()
        .map(row_parsers::db_report_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((reports, u64::try_from(total).unwrap_or_default()))
}

pub async fn update_notes(pool: &SqlitePool, report_id: Uuid, notes: Option<&str>) -> AppResult<bool> {
    let result = sqlx::query("UPDATE reports SET notes = ?, updated_at = ? WHERE id = ?")
        .bind(notes)
        .bind(timestamp_text(utc_now()))
        .bind(report_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_status(pool: &SqlitePool, report_id: Uuid, status: ReportStatus) -> AppResult<bool> {
    let result = sqlx::query("UPDATE reports SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(timestamp_text(utc_now()))
        .bind(report_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, report_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(report_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
