use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus};
use crate::models::user::{NewUser, ProfileUpdateRequest, RegisterRequest, Reporter, Role, User};
use crate::utils::{hash_password, require_text, verify_password};

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
    events: EventBus,
}

impl UserService {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// Self-service sign up. Always produces an `Employee`.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        let user = create_user(
            &self.pool,
            NewUser {
                email: request.email,
                password: request.password,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::Employee,
            },
        )
        .await?;

        log_activity(&self.events, "registered", Some(user.id), &user, None);
        Ok(user)
    }

    /// The user behind `email`/`password`. Unknown email and wrong password look the same.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let email = require_text("email", email)?;
        if password.is_empty() {
            return Err(AppError::bad_request("password is required"));
        }

        let db_user = db::users::find_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

        if !verify_password(password, &db_user.password_hash)? {
            return Err(AppError::unauthorized("invalid credentials"));
        }

        Ok(db_user.into())
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<User> {
        db::users::find_by_id(&self.pool, user_id)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Apply a partial profile update. Blank fields are left unchanged.
    pub async fn update_profile(&self, user_id: Uuid, request: ProfileUpdateRequest) -> AppResult<User> {
        let before = self.get(user_id).await?;

        let pick = |value: Option<String>, current: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| current.to_string())
        };
        let email = pick(request.email, &before.email);
        let first_name = pick(request.first_name, &before.first_name);
        let last_name = pick(request.last_name, &before.last_name);

        if !email.contains('@') {
            return Err(AppError::bad_request("email is invalid"));
        }
        if email != before.email && db::users::email_taken(&self.pool, &email, Some(user_id)).await? {
            return Err(AppError::conflict("email already in use"));
        }

        db::users::update_profile(&self.pool, user_id, &email, &first_name, &last_name).await?;
        let after = self.get(user_id).await?;

        log_activity(&self.events, "updated", Some(user_id), &after, Some(&before));
        Ok(after)
    }

    /// Delete the account together with its reports.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        let user = self.get(user_id).await?;
        if !db::users::delete(&self.pool, user_id).await? {
            return Err(AppError::not_found("user not found"));
        }

        tracing::info!(user_id = %user_id, "account deleted");
        log_activity(&self.events, "deleted", Some(user_id), &user, None);
        Ok(())
    }

    pub async fn reporters(&self) -> AppResult<Vec<Reporter>> {
        db::users::reporters(&self.pool).await
    }
}

/// Validate and store a new identity with an explicit role.
///
/// Registration goes through here with `Role::Employee`; the operator CLI is
/// the only caller that passes `Role::Manager`.
pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> AppResult<User> {
    let email = require_text("email", &new_user.email)?;
    let first_name = require_text("firstName", &new_user.first_name)?;
    let last_name = require_text("lastName", &new_user.last_name)?;
    if !email.contains('@') {
        return Err(AppError::bad_request("email is invalid"));
    }

    if db::users::email_taken(pool, &email, None).await? {
        return Err(AppError::conflict("email already in use"));
    }

    let password_hash = hash_password(&new_user.password)?;
    let user_id = db::users::insert(pool, &email, &password_hash, &first_name, &last_name, new_user.role).await?;

    db::users::find_by_id(pool, user_id)
        .await?
        .map(User::from)
        .ok_or_else(|| AppError::internal("user vanished after insert"))
}
