use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{PolicyEvaluator, ReportPolicy};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, reports, users};
use crate::services::{ReportService, UserService};
use crate::storage::{FileStorage, LocalFileStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub storage: Arc<dyn FileStorage>,
    pub event_bus: EventBus,
    pub reports: ReportService,
    pub users: UserService,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, storage: Arc<dyn FileStorage>, event_bus: EventBus) -> Self {
        let policy: Arc<dyn PolicyEvaluator> = Arc::new(ReportPolicy::new());

        Self {
            reports: ReportService::new(pool.clone(), policy, event_bus.clone()),
            users: UserService::new(pool.clone(), event_bus.clone()),
            pool,
            jwt: Arc::new(jwt),
            storage,
            event_bus,
        }
    }
}

/// Build the router from an already-migrated pool and the startup configuration.
///
/// Must be called inside a tokio runtime: it spawns the activity-log listener.
pub async fn create_app(pool: SqlitePool, config: &AppConfig) -> Result<Router, AppError> {
    let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&config.upload_dir));

    let (event_bus, event_rx) = init_event_bus();
    tokio::spawn(start_activity_listener(event_rx, pool.clone()));

    let state = AppState::new(pool, config.jwt.clone(), storage, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/me", get(users::me).put(users::update_me).delete(users::delete_me))
        .route("/reporters", get(users::list_reporters));

    let report_routes = Router::new()
        .route(
            "/",
            get(reports::list_reports)
                .post(reports::create_report)
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/my", get(reports::list_my_reports))
        .route("/download/:filename", get(reports::download_report_file))
        .route(
            "/:id",
            get(reports::get_report)
                .put(reports::update_report_notes)
                .delete(reports::delete_report),
        )
        .route("/:id/status", put(reports::update_report_status));

    let router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/reports", report_routes)
        .route("/api/health", get(health::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
