use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, Reporter, Role};
use crate::utils::{timestamp_text, utc_now};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, created_at, updated_at";

pub async fn insert(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> AppResult<Uuid> {
    let user_id = Uuid::new_v4();
    let now = timestamp_text(utc_now());

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, first_name, last_name, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id.to_string())
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(map_unique_email)?;

    Ok(user_id)
}

pub async fn find_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_parsers::db_user_from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;

    row.as_ref().map(row_parsers::db_user_from_row).transpose()
}

/// Whether `email` belongs to someone other than `except`.
pub async fn email_taken(pool: &SqlitePool, email: &str, except: Option<Uuid>) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ? AND id != ?")
        .bind(email)
        .bind(except.map(|id| id.to_string()).unwrap_or_default())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> AppResult<()> {
    sqlx::query("UPDATE users SET email = ?, first_name = ?, last_name = ?, updated_at = ? WHERE id = ?")
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(timestamp_text(utc_now()))
        .bind(user_id.to_string())
        .execute(pool)
        .await
        .map_err(map_unique_email)?;

    Ok(())
}

/// Delete the identity. Its reports go with it (`ON DELETE CASCADE`).
pub async fn delete(pool: &SqlitePool, user_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Users with at least one report, by first name.
pub async fn reporters(pool: &SqlitePool) -> AppResult<Vec<Reporter>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT u.id, u.first_name, u.last_name
        FROM users u
        WHERE EXISTS (SELECT 1 FROM reports r WHERE r.user_id = u.id)
        ORDER BY u.first_name ASC, u.last_name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, first_name, last_name)| {
            Ok(Reporter {
                id: Uuid::parse_str(&id).map_err(|e| AppError::internal(format!("invalid uuid: {e}")))?,
                first_name,
                last_name,
            })
        })
        .collect()
}

fn map_unique_email(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => AppError::conflict("email already in use"),
        _ => AppError::Database(err),
    }
}
