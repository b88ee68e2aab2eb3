use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::pagination::ReportPage;
use crate::routes::{auth, health, reports, users};

#[derive(OpenApi)]
#[openapi(
	paths(
		auth::register,
		auth::login,
		auth::logout,
		reports::create_report,
		reports::list_reports,
		reports::list_my_reports,
		reports::get_report,
		reports::update_report_notes,
		reports::update_report_status,
		reports::delete_report,
		reports::download_report_file,
		users::me,
		users::update_me,
		users::delete_me,
		users::list_reporters,
		health::health
	),
	components(
		schemas(
			models::user::Role,
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::RegisterRequest,
			models::user::ProfileUpdateRequest,
			models::user::Reporter,
			models::report::ReportStatus,
			models::report::ReportOwner,
			models::report::Report,
			models::report::ReportUploadForm,
			models::report::NotesUpdateRequest,
			models::report::StatusUpdateRequest,
			ReportPage,
			auth::MessageResponse,
			health::HealthResponse
		)
	),
	modifiers(&SecurityAddon),
	tags(
		(name = "Auth", description = "Registration and login"),
		(name = "Reports", description = "Employee reports and their review status"),
		(name = "Users", description = "The caller's own account"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme(
				"bearerAuth",
				SecurityScheme::Http(
					HttpBuilder::new()
						.scheme(HttpAuthScheme::Bearer)
						.bearer_format("JWT")
						.build(),
				),
			);
		}
	}
}

pub fn build_openapi(port: u16, tls: bool) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	add_examples(&mut doc);
	ensure_servers(&mut doc, port, tls);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn normalize_path_operations(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		let snapshot = paths.clone();
		for (path, item) in snapshot {
			if let Some(ops) = item.as_object() {
				let mut normalized = Map::new();
				for (method, val) in ops {
					let key = method.to_lowercase();
					if let Some(existing) = normalized.get_mut(&key) {
						merge_values(existing, val);
					} else {
						normalized.insert(key, val.clone());
					}
				}
				paths.insert(path, Value::Object(normalized));
			}
		}
	}
}

fn add_examples(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		for item in paths.values_mut() {
			if let Some(operations) = item.as_object_mut() {
				for operation in operations.values_mut() {
					apply_parameter_examples(operation);
					apply_request_examples(operation);
				}
			}
		}
	}
}

fn apply_parameter_examples(operation: &mut Value) {
	let Some(parameters) = operation.get_mut("parameters").and_then(Value::as_array_mut) else { return; };

	for parameter in parameters.iter_mut() {
		let example = match parameter.get("name").and_then(Value::as_str) {
			Some("id") | Some("userId") => json!("00000000-0000-0000-0000-000000000000"),
			Some("sortBy") => json!("createdAt"),
			Some("sortOrder") => json!("desc"),
			Some("status") => json!("Submitted"),
			Some("date") => json!("2025-03-01"),
			_ => continue,
		};
		if let Some(obj) = parameter.as_object_mut() {
			obj.entry("example").or_insert(example);
		}
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(request_body) = operation.get_mut("requestBody") else { return; };
	let Some(content) = request_body.get_mut("content").and_then(Value::as_object_mut) else { return; };
	let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { return; };
	let Some(reference) = app_json
		.get("schema")
		.and_then(|schema| schema.get("$ref"))
		.and_then(Value::as_str)
	else {
		return;
	};

	let example = match reference {
		"#/components/schemas/LoginRequest" => json!({
			"email": "ada@example.com",
			"password": "S3cureP@ssw0rd"
		}),
		"#/components/schemas/RegisterRequest" => json!({
			"email": "ada@example.com",
			"password": "S3cureP@ssw0rd",
			"firstName": "Ada",
			"lastName": "Lovelace"
		}),
		"#/components/schemas/NotesUpdateRequest" => json!({ "notes": "Added Q3 numbers" }),
		"#/components/schemas/StatusUpdateRequest" => json!({ "status": "Reviewed" }),
		_ => return,
	};

	app_json.insert("example".to_string(), example);
}

fn ensure_servers(doc: &mut Value, port: u16, tls: bool) {
	let scheme = if tls { "https" } else { "http" };
	let server_url = format!("{}://localhost:{}", scheme, port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
