mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{body_json, json_request, request, TestApp};

fn ids(page: &Value) -> Vec<String> {
    page["reports"]
        .as_array()
        .map(|items| items.iter().filter_map(|r| r["id"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn pages_through_twenty_five_reports() -> Result<()> {
    let t = TestApp::spawn().await?;
    let e1 = t.employee("e1@example.com", "Erin", "One").await?;
    let m = t.manager("boss@example.com").await?;

    for i in 0..25 {
        t.upload(&e1, &format!("r{i}.txt"), format!("report {i}").as_bytes(), None).await?;
    }

    let resp = t.send(request("GET", "/reports?page=1&size=10", Some(&m.token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let first = body_json(resp).await?;
    assert_eq!(first["totalItems"], 25);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(first["currentPage"], 1);
    assert_eq!(ids(&first).len(), 10);

    let resp = t.send(request("GET", "/reports?page=3&size=10", Some(&m.token))?).await?;
    let last = body_json(resp).await?;
    assert_eq!(last["currentPage"], 3);
    assert_eq!(ids(&last).len(), 5);

    let resp = t.send(request("GET", "/reports?page=2&size=10", Some(&m.token))?).await?;
    let middle = body_json(resp).await?;
    let mut seen: Vec<String> = ids(&first);
    seen.extend(ids(&middle));
    seen.extend(ids(&last));
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 25, "pages overlap or skip reports");

    // Past the end is an empty page, not an error.
    let resp = t.send(request("GET", "/reports?page=9&size=10", Some(&m.token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let beyond = body_json(resp).await?;
    assert!(ids(&beyond).is_empty());
    assert_eq!(beyond["totalItems"], 25);

    Ok(())
}

#[tokio::test]
async fn status_filter_holds_for_any_sort_order() -> Result<()> {
    let t = TestApp::spawn().await?;
    let e1 = t.employee("e1@example.com", "Erin", "One").await?;
    let m = t.manager("boss@example.com").await?;

    let mut reviewed = Vec::new();
    for i in 0..4 {
        let report = t.upload(&e1, &format!("r{i}.pdf"), b"x", None).await?;
        if i % 2 == 0 {
            let id = report["id"].as_str().unwrap().to_string();
            let resp = t
                .send(json_request(
                    "PUT",
                    &format!("/reports/{id}/status"),
                    Some(&m.token),
                    &json!({ "status": "Reviewed" }),
                )?)
                .await?;
            assert_eq!(resp.status(), StatusCode::OK);
            reviewed.push(id);
        }
    }

    for order in ["asc", "desc"] {
        let uri = format!("/reports?status=Reviewed&sortBy=updatedAt&sortOrder={order}");
        let page = body_json(t.send(request("GET", &uri, Some(&m.token))?).await?).await?;
        assert_eq!(page["totalItems"], 2);
        for report in page["reports"].as_array().unwrap() {
            assert_eq!(report["status"], "Reviewed");
        }
        let mut got = ids(&page);
        got.sort();
        let mut want = reviewed.clone();
        want.sort();
        assert_eq!(got, want);
    }

    let page = body_json(t.send(request("GET", "/reports?status=Rejected", Some(&m.token))?).await?).await?;
    assert_eq!(page["totalItems"], 0);

    Ok(())
}

#[tokio::test]
async fn sorts_by_employee_name() -> Result<()> {
    let t = TestApp::spawn().await?;
    let zed = t.employee("zed@example.com", "Zed", "Last").await?;
    let amy = t.employee("amy@example.com", "Amy", "First").await?;
    let m = t.manager("boss@example.com").await?;

    t.upload(&zed, "z.pdf", b"z", None).await?;
    t.upload(&amy, "a.pdf", b"a", None).await?;

    let page = body_json(
        t.send(request("GET", "/reports?sortBy=employee&sortOrder=asc", Some(&m.token))?)
            .await?,
    )
    .await?;
    assert_eq!(page["reports"][0]["user"]["firstName"], "Amy");
    assert_eq!(page["reports"][1]["user"]["firstName"], "Zed");

    let page = body_json(
        t.send(request("GET", "/reports?sortBy=employee&sortOrder=desc", Some(&m.token))?)
            .await?,
    )
    .await?;
    assert_eq!(page["reports"][0]["user"]["firstName"], "Zed");

    Ok(())
}

#[tokio::test]
async fn filters_by_owner_and_date() -> Result<()> {
    let t = TestApp::spawn().await?;
    let e1 = t.employee("e1@example.com", "Erin", "One").await?;
    let e2 = t.employee("e2@example.com", "Eli", "Two").await?;
    let m = t.manager("boss@example.com").await?;

    t.upload(&e1, "a.pdf", b"a", None).await?;
    t.upload(&e1, "b.pdf", b"b", None).await?;
    t.upload(&e2, "c.pdf", b"c", None).await?;

    let uri = format!("/reports?userId={}", e2.id);
    let page = body_json(t.send(request("GET", &uri, Some(&m.token))?).await?).await?;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["reports"][0]["userId"], json!(e2.id.to_string()));

    let page = body_json(t.send(request("GET", "/reports?date=2000-01-01", Some(&m.token))?).await?).await?;
    assert_eq!(page["totalItems"], 3);

    let page = body_json(t.send(request("GET", "/reports?date=2999-01-01", Some(&m.token))?).await?).await?;
    assert_eq!(page["totalItems"], 0);

    // Blank parameters count as absent.
    let page = body_json(
        t.send(request("GET", "/reports?date=&status=&userId=&sortBy=", Some(&m.token))?)
            .await?,
    )
    .await?;
    assert_eq!(page["totalItems"], 3);

    Ok(())
}

#[tokio::test]
async fn rejects_bad_listing_parameters() -> Result<()> {
    let t = TestApp::spawn().await?;
    let m = t.manager("boss@example.com").await?;

    for uri in [
        "/reports?page=0",
        "/reports?size=abc",
        "/reports?sortBy=password",
        "/reports?sortOrder=sideways",
        "/reports?status=Archived",
        "/reports?date=yesterday",
        "/reports?userId=nobody",
    ] {
        let resp = t.send(request("GET", uri, Some(&m.token))?).await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri} should be rejected");
    }

    Ok(())
}

#[tokio::test]
async fn my_reports_are_scoped_to_the_caller() -> Result<()> {
    let t = TestApp::spawn().await?;
    let e1 = t.employee("e1@example.com", "Erin", "One").await?;
    let e2 = t.employee("e2@example.com", "Eli", "Two").await?;

    t.upload(&e1, "a.pdf", b"a", None).await?;
    t.upload(&e2, "b.pdf", b"b", None).await?;
    t.upload(&e2, "c.pdf", b"c", None).await?;

    let page = body_json(t.send(request("GET", "/reports/my", Some(&e1.token))?).await?).await?;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["reports"][0]["userId"], json!(e1.id.to_string()));

    // A userId parameter cannot widen the scope.
    let uri = format!("/reports/my?userId={}", e2.id);
    let page = body_json(t.send(request("GET", &uri, Some(&e1.token))?).await?).await?;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["reports"][0]["userId"], json!(e1.id.to_string()));

    Ok(())
}

// Listing every report is open to any authenticated caller, employees included.
// Reports from other owners are visible in the listing even though a direct
// read of one of them is forbidden.
#[tokio::test]
async fn employee_may_list_all_reports() -> Result<()> {
    let t = TestApp::spawn().await?;
    let e1 = t.employee("e1@example.com", "Erin", "One").await?;
    let e2 = t.employee("e2@example.com", "Eli", "Two").await?;

    let other = t.upload(&e2, "b.pdf", b"b", None).await?;
    t.upload(&e1, "a.pdf", b"a", None).await?;

    let resp = t.send(request("GET", "/reports", Some(&e1.token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await?;
    assert_eq!(page["totalItems"], 2);

    let uri = format!("/reports/{}", other["id"].as_str().unwrap());
    let resp = t.send(request("GET", &uri, Some(&e1.token))?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}
