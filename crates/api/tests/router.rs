//! Black-box tests against the full router (same wiring as prod, in-memory store).

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use repdesk_api::app::{build_app, services::AppServices};

fn app() -> Router {
    build_app(AppServices::in_memory())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    // Extractor rejections answer in plain text.
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/session/login",
        None,
        Some(json!({ "email": "ana@engmat.com.br", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn quote_body() -> Value {
    json!({
        "constructorName": "Construtora Horizonte",
        "workName": "Residencial Aurora",
        "date": "2024-03-04",
        "factory": "MGM",
        "product": "Fechadura",
        "value": 12500.0
    })
}

fn order_body() -> Value {
    json!({
        "constructorName": "Construtora Horizonte",
        "workName": "Residencial Aurora",
        "sendDate": "2024-03-10",
        "factory": "Condex",
        "product": "Cabos",
        "quantity": 10,
        "value": 10000.0
    })
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn data_routes_require_login() {
    let app = app();
    for uri in ["/quotes", "/orders", "/settings", "/reports/dashboard", "/session"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized");
    }

    let bogus = repdesk_auth::SessionToken::new().to_string();
    let (status, _) = send(&app, "GET", "/quotes", Some(&bogus), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let (status, body) = send(
        &app(),
        "POST",
        "/session/login",
        None,
        Some(json!({ "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_email");
}

#[tokio::test]
async fn session_reports_the_user_and_logout_revokes_it() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(&app, "GET", "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "ana");

    let (status, _) = send(&app, "POST", "/session/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/quotes", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn quote_lifecycle() {
    let app = app();
    let token = login(&app).await;

    let (status, quote) = send(&app, "POST", "/quotes", Some(&token), Some(quote_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(quote["status"], "Enviado");
    let id = quote["id"].as_str().unwrap().to_string();

    let (status, note) = send(
        &app,
        "POST",
        &format!("/quotes/{id}/follow-ups"),
        Some(&token),
        Some(json!({ "note": "liguei" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["note"], "liguei");

    let mut edited = quote.clone();
    edited["status"] = json!("Fechado");
    let (status, updated) = send(&app, "PUT", &format!("/quotes/{id}"), Some(&token), Some(edited)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Fechado");

    let (_, list) = send(&app, "GET", "/quotes?status=Fechado&search=aurora", Some(&token), None).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
    let (_, list) = send(&app, "GET", "/quotes?status=Perdido", Some(&token), None).await;
    assert!(list["items"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "DELETE", &format!("/quotes/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/quotes/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn foreign_product_is_a_validation_error() {
    let app = app();
    let token = login(&app).await;
    let mut body = quote_body();
    body["product"] = json!("Cabos");

    let (status, body) = send(&app, "POST", "/quotes", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn order_lifecycle_through_invoice() {
    let app = app();
    let token = login(&app).await;

    let (status, order) = send(&app, "POST", "/orders", Some(&token), Some(order_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["poNumber"], format!("OC-{}-0001", Utc::now().year()));
    assert_eq!(order["deliveryDate"], "2024-03-25");
    assert_eq!(order["status"], "Aguardando digitação");
    let id = order["id"].as_str().unwrap().to_string();

    let (status, pinned) = send(
        &app,
        "PUT",
        &format!("/orders/{id}/delivery"),
        Some(&token),
        Some(json!({ "manual": true, "date": "2024-04-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["isManualDeliveryDate"], true);
    assert_eq!(pinned["deliveryDate"], "2024-04-30");

    let (status, invoiced) = send(
        &app,
        "POST",
        &format!("/orders/{id}/invoice"),
        Some(&token),
        Some(json!({ "invoiceDate": "2024-03-20", "paymentTerms": "30/60 dias", "commissionRate": 5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoiced["status"], "Faturado");

    let (status, schedule) = send(
        &app,
        "GET",
        &format!("/orders/{id}/installments"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule["items"].as_array().unwrap().len(), 2);
    assert_eq!(schedule["total"], 500.0);

    let (status, billing) = send(
        &app,
        "GET",
        "/reports/billing?start=2024-03-01&end=2024-05-31",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(billing["totalRevenue"], 10000.0);

    let (status, dashboard) = send(
        &app,
        "GET",
        "/reports/dashboard?start=2024-03-01&end=2024-03-31&factory=Condex",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["orders"]["count"], 1);
}

#[tokio::test]
async fn malformed_ids_and_ranges_are_bad_requests() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(&app, "GET", "/orders/not-an-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = send(
        &app,
        "GET",
        "/reports/dashboard?start=2024-03-10&end=2024-03-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_range");

    let (status, _) = send(&app, "GET", "/orders?factory=Acme", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_calendar_days_are_rejected_without_breaking_reports() {
    let app = app();
    let token = login(&app).await;

    let mut body = order_body();
    body["sendDate"] = json!("+262142-12-31");
    let (status, _) = send(&app, "POST", "/orders", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = order_body();
    body["sendDate"] = json!("9999-12-31");
    let (status, err) = send(&app, "POST", "/orders", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_date");

    let (_, order) = send(&app, "POST", "/orders", Some(&token), Some(order_body())).await;
    let id = order["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{id}/invoice"),
        Some(&token),
        Some(json!({ "invoiceDate": "+262142-12-31", "paymentTerms": "30 dias" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{id}/invoice"),
        Some(&token),
        Some(json!({ "invoiceDate": "9999-12-20", "paymentTerms": "30 dias" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, schedule) = send(
        &app,
        "GET",
        &format!("/orders/{id}/installments"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule["items"][0]["date"], "9999-12-31");

    let (status, _) = send(&app, "GET", "/reports/billing", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/reports/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn settings_round_trip() {
    let app = app();
    let token = login(&app).await;

    let (status, settings) = send(&app, "GET", "/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["products"]["Cabos"]["leadTimeDays"], 15);

    let body = json!({
        "products": { "Cabos": { "leadTimeDays": 20 } },
        "targets": { "Condex": { "monthlyTarget": 30000.0 } }
    });
    let (status, _) = send(&app, "PUT", "/settings", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = send(&app, "POST", "/orders", Some(&token), Some(order_body())).await;
    assert_eq!(order["deliveryDate"], "2024-03-30");
}
