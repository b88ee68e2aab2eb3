use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::extract::AppJson;
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Employee account registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = state.users.register(payload).await?;
    let token = state.jwt.encode(&user)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = state.users.authenticate(&payload.email, &payload.password).await?;
    let token = state.jwt.encode(&user)?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Logout acknowledged", body = MessageResponse))
)]
pub async fn logout(_auth: AuthUser) -> AppResult<Json<MessageResponse>> {
    // Tokens are stateless; the client drops its copy.
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
