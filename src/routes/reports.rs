use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::extract::AppJson;
use crate::jwt::AuthUser;
use crate::models::report::{
    NewReport, NotesUpdateRequest, Report, ReportListQuery, ReportUploadForm, StatusUpdateRequest,
};
use crate::pagination::ReportPage;
use crate::storage::is_valid_reference;

#[utoipa::path(
    post,
    path = "/reports",
    tag = "Reports",
    security(("bearerAuth" = [])),
    request_body(content = ReportUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report submitted", body = Report),
        (status = 400, description = "File missing or form malformed")
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<Report>)> {
    let mut multipart = multipart.map_err(|err| AppError::bad_request(err.body_text()))?;

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    let mut notes: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("notes") => {
                notes = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| AppError::bad_request("file is required"))?;
    let file_path = state.storage.save(file_name.as_deref(), &bytes).await?;

    let created = state
        .reports
        .create(&auth.principal(), NewReport { file_path: file_path.clone(), notes })
        .await;

    match created {
        Ok(report) => Ok((StatusCode::CREATED, Json(report))),
        Err(err) => {
            if let Err(cleanup) = state.storage.remove(&file_path).await {
                tracing::warn!(file = %file_path, error = %cleanup, "failed to remove orphaned upload");
            }
            Err(err)
        }
    }
}

#[utoipa::path(
    get,
    path = "/reports",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(ReportListQuery),
    responses(
        (status = 200, description = "Page of reports across all owners", body = ReportPage),
        (status = 400, description = "Invalid paging, sorting or filter parameter")
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportListQuery>,
) -> AppResult<Json<ReportPage>> {
    let options = query.into_options()?;
    let page = state.reports.list_all(&auth.principal(), options).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/reports/my",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(ReportListQuery),
    responses(
        (status = 200, description = "Page of the caller's reports; userId is ignored", body = ReportPage),
        (status = 400, description = "Invalid paging, sorting or filter parameter")
    )
)]
pub async fn list_my_reports(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportListQuery>,
) -> AppResult<Json<ReportPage>> {
    let options = query.into_options()?;
    let page = state.reports.list_mine(&auth.principal(), options).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report detail", body = Report),
        (status = 403, description = "Not the owner and not a manager"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Report>> {
    let report = state.reports.get(&auth.principal(), report_id(&id)?).await?;
    Ok(Json(report))
}

#[utoipa::path(
    put,
    path = "/reports/{id}",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = NotesUpdateRequest,
    responses(
        (status = 200, description = "Notes replaced", body = Report),
        (status = 403, description = "Not the owner and not a manager"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn update_report_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<NotesUpdateRequest>,
) -> AppResult<Json<Report>> {
    let report = state
        .reports
        .update_notes(&auth.principal(), report_id(&id)?, payload.notes)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    put,
    path = "/reports/{id}/status",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status changed", body = Report),
        (status = 400, description = "Status missing, unknown, not assignable or not reachable"),
        (status = 403, description = "Managers only"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn update_report_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<StatusUpdateRequest>,
) -> AppResult<Json<Report>> {
    let report = state
        .reports
        .update_status(&auth.principal(), report_id(&id)?, payload.status.as_deref())
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    delete,
    path = "/reports/{id}",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted; the stored file is kept"),
        (status = 403, description = "Not the owner and not a manager"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn delete_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.reports.delete(&auth.principal(), report_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/reports/download/{filename}",
    tag = "Reports",
    security(("bearerAuth" = [])),
    params(("filename" = String, Path, description = "Stored file reference, as found in `filePath`")),
    responses(
        (status = 200, description = "File contents as application/octet-stream"),
        (status = 403, description = "Not the owner and not a manager"),
        (status = 404, description = "No report references this file, or it is gone")
    )
)]
pub async fn download_report_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !is_valid_reference(&filename) {
        return Err(AppError::not_found("file not found"));
    }

    state.reports.authorize_download(&auth.principal(), &filename).await?;
    let bytes = state.storage.read(&filename).await?;

    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Malformed ids cannot name an existing report.
fn report_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("report not found"))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::bad_request(err.body_text())
}
