use anyhow::Context;
use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::json;

mod common;

use common::{body_json, json_request, request, TestApp};

#[tokio::test]
async fn auth_edge_cases() -> Result<()> {
    let t = TestApp::spawn().await.context("failed to start app")?;

    // 1. Register with short password
    let short_pass_body = json!({
        "email": "short@example.com",
        "password": "short",
        "firstName": "Short",
        "lastName": "Pass"
    });
    let resp = t.send(json_request("POST", "/auth/register", None, &short_pass_body)?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "Should fail with bad request for short password");

    // 2. Register with a missing name
    let no_name_body = json!({
        "email": "noname@example.com",
        "password": "password123",
        "firstName": "",
        "lastName": "Pass"
    });
    let resp = t.send(json_request("POST", "/auth/register", None, &no_name_body)?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "Should fail with bad request for blank first name");

    // 3. Register with valid user; the role is always Employee
    let valid_body = json!({
        "email": "valid@example.com",
        "password": "password123",
        "firstName": "Valid",
        "lastName": "User",
        "role": "Manager"
    });
    let resp = t.send(json_request("POST", "/auth/register", None, &valid_body)?).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await?;
    assert_eq!(v["user"]["role"], "Employee");
    assert!(v["token"].as_str().is_some());

    // 4. Register the same email again
    let resp = t.send(json_request("POST", "/auth/register", None, &valid_body)?).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT, "Should fail with conflict for duplicate email");

    // 5. Login with wrong password
    let wrong_pass_body = json!({
        "email": "valid@example.com",
        "password": "wrongpassword"
    });
    let resp = t.send(json_request("POST", "/auth/login", None, &wrong_pass_body)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "Should fail with unauthorized for wrong password");

    // 6. Login with non-existent email
    let no_user_body = json!({
        "email": "nobody@example.com",
        "password": "password123"
    });
    let resp = t.send(json_request("POST", "/auth/login", None, &no_user_body)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "Should fail with unauthorized for non-existent user");

    // 7. Login with the right password
    let good_body = json!({
        "email": "valid@example.com",
        "password": "password123"
    });
    let resp = t.send(json_request("POST", "/auth/login", None, &good_body)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await?;
    let token = v["token"].as_str().context("token missing")?.to_string();

    // 8. Access protected route without token
    let resp = t.send(request("GET", "/reports/my", None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "Should fail with unauthorized for missing token");

    // 9. Token signed with another secret
    let foreign = report_desk::jwt::JwtConfig::new("other-secret", 1);
    let user: report_desk::models::user::User = serde_json::from_value(v["user"].clone())?;
    let forged = foreign.encode(&user)?;
    let resp = t.send(request("GET", "/users/me", Some(&forged))?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "Should fail with unauthorized for foreign token");

    // 10. Logout is acknowledged for a valid token
    let resp = t.send(request("POST", "/auth/logout", Some(&token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // 11. Malformed JSON body
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let resp: Response = t.send(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "Should fail with bad request for malformed JSON");

    Ok(())
}
