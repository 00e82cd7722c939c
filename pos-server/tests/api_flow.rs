//! End-to-end HTTP tests against an in-memory database

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pos_server::core::config::parse_branches;
use pos_server::db::DbService;
use pos_server::services::https::build_router;
use pos_server::{Config, ServerState};

async fn app() -> Router {
    let mut config = Config::with_overrides("/tmp/pos-server-it", 0);
    config.branches = parse_branches("china_town:China Town,place_india:Place India");
    config.tables_per_branch = 5;
    config.admin_username = "admin".into();
    config.admin_password = "admin123".into();
    config.supervisor_password = "1991".into();

    let pool = DbService::memory().await.unwrap().pool;
    let state = ServerState::with_pool(config, pool).await.unwrap();
    build_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn api_requires_token() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/api/meals", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/meals", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn me_returns_admin_profile() {
    let app = app().await;
    let token = login(&app, "admin", "admin123").await;
    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn empty_meal_name_is_rejected() {
    let app = app().await;
    let token = login(&app, "admin", "admin123").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/meals",
        Some(&token),
        Some(json!({ "name": "  ", "selling_price": 10.0, "ingredients": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["code"].is_number());
}

#[tokio::test]
async fn staff_cannot_open_back_office() {
    let app = app().await;
    let admin = login(&app, "admin", "admin123").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({ "username": "cashier", "password": "secret1", "role": "staff" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let cashier = login(&app, "cashier", "secret1").await;
    let (status, _) = send(&app, "GET", "/api/employees", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // default cashier grants cover the table screen
    let (status, body) = send(&app, "GET", "/api/tables/china_town", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn draft_checkout_and_print_flow() {
    let app = app().await;
    let token = login(&app, "admin", "admin123").await;

    let (status, meal) = send(
        &app,
        "POST",
        "/api/meals",
        Some(&token),
        Some(json!({ "name": "Chicken Biryani", "selling_price": 25.0, "ingredients": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{meal}");
    let meal_id = meal["id"].as_i64().unwrap();

    let (status, saved) = send(
        &app,
        "PUT",
        "/api/drafts/china_town/3",
        Some(&token),
        Some(json!({ "items": [{ "meal_id": meal_id, "quantity": 2 }], "tax_pct": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    assert_eq!(saved["deleted"], false);
    let draft_id = saved["draft"]["id"].as_i64().unwrap();
    let version = saved["draft"]["version"].as_i64().unwrap();

    // stale version
    let (status, _) = send(
        &app,
        "PUT",
        "/api/drafts/china_town/3",
        Some(&token),
        Some(json!({
            "items": [{ "meal_id": meal_id, "quantity": 3 }],
            "expected_version": version - 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, checkout) = send(
        &app,
        "POST",
        &format!("/api/drafts/{draft_id}/checkout"),
        Some(&token),
        Some(json!({ "payment_method": "CASH", "tax_pct": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{checkout}");
    assert_eq!(checkout["total_amount"], 50.0);
    let invoice_id = checkout["invoice_id"].as_i64().unwrap();

    let (status, receipt) = send(
        &app,
        "GET",
        &format!("/api/invoices/{invoice_id}/receipt"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!receipt["qr_base64"].as_str().unwrap().is_empty());

    let (status, invoice) = send(
        &app,
        "POST",
        &format!("/api/invoices/{invoice_id}/confirm-print"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["print_status"], "confirmed");
    assert_eq!(invoice["payment_status"], "paid");
}

#[tokio::test]
async fn event_stream_delivers_draft_sync() {
    let app = app().await;
    let token = login(&app, "admin", "admin123").await;
    let (_, meal) = send(
        &app,
        "POST",
        "/api/meals",
        Some(&token),
        Some(json!({ "name": "Mango Lassi", "selling_price": 8.0, "ingredients": [] })),
    )
    .await;
    let meal_id = meal["id"].as_i64().unwrap();

    let request = Request::builder()
        .uri("/api/events")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let mut body = response.into_body();

    let (status, _) = send(
        &app,
        "PUT",
        "/api/drafts/place_india/2",
        Some(&token),
        Some(json!({ "items": [{ "meal_id": meal_id, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut seen = String::new();
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                seen.push_str(&String::from_utf8_lossy(&data));
            }
            if seen.contains("event: sync") && seen.contains("\"resource\":\"draft\"") {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);
    assert!(found, "no draft sync event in: {seen}");
    assert!(seen.contains("\"branch\":\"place_india\""));
}
