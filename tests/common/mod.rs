#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use report_desk::config::AppConfig;
use report_desk::create_app;
use report_desk::jwt::JwtConfig;
use report_desk::models::user::{NewUser, Role};
use report_desk::services::create_user;

pub const BOUNDARY: &str = "report-desk-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    // Dropped last: owns the database file and the uploads.
    _dir: TempDir,
}

/// A caller with a valid token.
pub struct Actor {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let dir = tempdir().context("failed to create tempdir")?;
        let db_path = dir.path().join("test.db");

        let opts = SqliteConnectOptions::new()
            .filename(db_path.as_path())
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await?;

        let migrator =
            sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
        migrator.run(&pool).await?;

        let jwt = JwtConfig::new("test-secret", 1);
        let upload_dir = dir.path().join("uploads");
        let config = AppConfig::new(format!("sqlite://{}", db_path.display()), jwt.clone(), &upload_dir);
        let app = create_app(pool.clone(), &config).await?;

        Ok(Self {
            app,
            pool,
            jwt,
            upload_dir,
            _dir: dir,
        })
    }

    pub async fn send(&self, req: Request<Body>) -> Result<Response> {
        Ok(self.app.clone().oneshot(req).await?)
    }

    /// Register an employee through the API.
    pub async fn employee(&self, email: &str, first_name: &str, last_name: &str) -> Result<Actor> {
        let body = json!({
            "email": email,
            "password": "password123",
            "firstName": first_name,
            "lastName": last_name
        });
        let resp = self.send(json_request("POST", "/auth/register", None, &body)?).await?;
        assert_eq!(resp.status(), StatusCode::CREATED, "registration of {email} failed");

        let v = body_json(resp).await?;
        let token = v["token"].as_str().context("token missing")?.to_string();
        let id = Uuid::parse_str(v["user"]["id"].as_str().context("user id missing")?)?;
        Ok(Actor { id, token })
    }

    /// Provision a manager the way an operator would, then mint its token.
    pub async fn manager(&self, email: &str) -> Result<Actor> {
        let user = create_user(
            &self.pool,
            NewUser {
                email: email.to_string(),
                password: "password123".to_string(),
                first_name: "Mia".to_string(),
                last_name: "Manager".to_string(),
                role: Role::Manager,
            },
        )
        .await?;
        let token = self.jwt.encode(&user)?;
        Ok(Actor { id: user.id, token })
    }

    /// Upload a report and return its JSON body.
    pub async fn upload(&self, actor: &Actor, file_name: &str, contents: &[u8], notes: Option<&str>) -> Result<Value> {
        let resp = self
            .send(multipart_request(&actor.token, Some((file_name, contents)), notes)?)
            .await?;
        assert_eq!(resp.status(), StatusCode::CREATED, "upload of {file_name} failed");
        body_json(resp).await
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

pub fn multipart_request(token: &str, file: Option<(&str, &[u8])>, notes: Option<&str>) -> Result<Request<Body>> {
    multipart_request_with_fields(token, file, notes, &[])
}

/// Like `multipart_request`, with extra plain text fields appended to the form.
pub fn multipart_request_with_fields(
    token: &str,
    file: Option<(&str, &[u8])>,
    notes: Option<&str>,
    extra: &[(&str, &str)],
) -> Result<Request<Body>> {
    let mut payload: Vec<u8> = Vec::new();

    if let Some((file_name, contents)) = file {
        payload.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        payload.extend_from_slice(contents);
        payload.extend_from_slice(b"\r\n");
    }
    if let Some(notes) = notes {
        payload.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\n{notes}\r\n").as_bytes(),
        );
    }
    for (name, value) in extra {
        payload.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    payload.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Ok(Request::builder()
        .method("POST")
        .uri("/reports")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(payload))?)
}

pub async fn body_json(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn body_bytes(resp: Response) -> Result<Vec<u8>> {
    Ok(body::to_bytes(resp.into_body(), 10_485_760).await?.to_vec())
}
