use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::extract::AppJson;
use crate::jwt::AuthUser;
use crate::models::user::{ProfileUpdateRequest, Reporter, User};

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let user = state.users.get(auth.user_id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<ProfileUpdateRequest>,
) -> AppResult<Json<User>> {
    let user = state.users.update_profile(auth.user_id, payload).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses((status = 204, description = "Account and its reports deleted"))
)]
pub async fn delete_me(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    state.users.delete(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/reporters",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Users that have submitted at least one report", body = [Reporter]))
)]
pub async fn list_reporters(State(state): State<AppState>, _auth: AuthUser) -> AppResult<Json<Vec<Reporter>>> {
    let reporters = state.users.reporters().await?;
    Ok(Json(reporters))
}
