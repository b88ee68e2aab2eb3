use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::query_scalar;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub storage_ok: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let db_check = query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;
    let storage_ok = state.storage.is_available().await;

    let db_ok = match db_check {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "health check database query failed");
            false
        }
    };
    let status = if db_ok && storage_ok { "ok" } else { "degraded" };

    Ok(Json(HealthResponse {
        status,
        db_ok,
        storage_ok,
    }))
}
