//! End-to-end tests driving the router in-process.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kardex_api::{build_router, ApiConfig, AppState};
use kardex_core::{Product, Role};
use kardex_db::repository::{product, tenant};
use kardex_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const TENANT: &str = "acme";

struct TestApp {
    router: Router,
    laptop: Product,
}

async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let mut conn = db.pool().acquire().await.unwrap();
    tenant::insert_tenant(&mut conn, TENANT, "Acme", "INV", None).await.unwrap();
    tenant::insert_user(&mut conn, TENANT, &tenant::user("u-admin", "Ada Admin", Role::Admin))
        .await
        .unwrap();
    let laptop = product::new_product(TENANT, "LAP-001", "Laptop", 10_000_000, 10);
    product::insert(&mut conn, &laptop).await.unwrap();
    drop(conn);

    TestApp {
        router: build_router(AppState::new(db, ApiConfig::default())),
        laptop,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        role: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call_with_language(method, uri, role, body, None).await
    }

    async fn call_with_language(
        &self,
        method: Method,
        uri: &str,
        role: Option<&str>,
        body: Option<Value>,
        language: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder
                .header("x-tenant-id", TENANT)
                .header("x-user-id", format!("u-{role}"))
                .header("x-user-role", role);
        }
        if let Some(language) = language {
            builder = builder.header("accept-language", language);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_invoice(&self, quantity: i64) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/invoices",
                Some("admin"),
                Some(json!({ "items": [{ "productId": self.laptop.id, "quantity": quantity }] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let app = spawn_app().await;
    let (status, body) = app.call(Method::GET, "/invoices", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn create_prices_invoice_and_reports_stock_movement() {
    let app = spawn_app().await;
    let body = app.create_invoice(2).await;

    assert_eq!(body["invoiceNumber"], "INV-000001");
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["paymentStatus"], "UNPAID");
    assert_eq!(body["subtotal"].as_f64(), Some(200_000.0));
    assert_eq!(body["tax"].as_f64(), Some(38_000.0));
    assert_eq!(body["total"].as_f64(), Some(238_000.0));
    assert_eq!(body["items"][0]["taxRate"].as_f64(), Some(19.0));
    assert_eq!(body["movements"][0]["movementType"], "SALE");
    assert_eq!(body["movements"][0]["quantity"], -2);
    assert_eq!(body["movements"][0]["stockAfter"], 8);
}

#[tokio::test]
async fn lifecycle_and_payment_flow() {
    let app = spawn_app().await;
    let created = app.create_invoice(1).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(Method::PATCH, &format!("/invoices/{id}/send"), Some("manager"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SENT");

    let (status, body) = app
        .call(Method::PATCH, &format!("/invoices/{id}/send"), Some("manager"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["kind"], "BUSINESS_RULE");

    let (status, payment) = app
        .call(
            Method::POST,
            "/payments",
            Some("manager"),
            Some(json!({ "invoiceId": id, "amount": 119000, "method": "BANK_TRANSFER" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");

    let (_, detail) = app.call(Method::GET, &format!("/invoices/{id}"), Some("staff"), None).await;
    assert_eq!(detail["paymentStatus"], "PAID");
    assert_eq!(detail["status"], "SENT");
    assert_eq!(detail["balance"].as_f64(), Some(0.0));

    let payment_id = payment["id"].as_str().unwrap();
    let (status, _) = app
        .call(Method::DELETE, &format!("/payments/{payment_id}"), Some("manager"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::DELETE, &format!("/payments/{payment_id}"), Some("admin"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, detail) = app.call(Method::GET, &format!("/invoices/{id}"), Some("admin"), None).await;
    assert_eq!(detail["paymentStatus"], "UNPAID");
}

#[tokio::test]
async fn staff_cannot_create_invoices() {
    let app = spawn_app().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/invoices",
            Some("staff"),
            Some(json!({ "items": [{ "productId": app.laptop.id, "quantity": 1 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = spawn_app().await;
    let (status, body) = app
        .call(Method::POST, "/invoices", Some("admin"), Some(json!({ "items": "nope" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn errors_are_localized() {
    let app = spawn_app().await;
    let uri = "/invoices/6f1c2a8e-0000-4000-8000-000000000000";

    let (status, body) = app
        .call_with_language(Method::GET, uri, Some("admin"), None, Some("es-CO,es;q=0.9"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "INVOICE_NOT_FOUND");
    assert!(body["message"].as_str().unwrap().starts_with("No se encontró la factura"));

    let (_, body) = app.call(Method::GET, uri, Some("admin"), None).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invoice not found"));
}

#[tokio::test]
async fn list_is_paginated() {
    let app = spawn_app().await;
    for _ in 0..3 {
        app.create_invoice(1).await;
    }

    let (status, body) = app
        .call(Method::GET, "/invoices?page=2&limit=2", Some("staff"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"], json!({ "total": 3, "page": 2, "limit": 2, "totalPages": 2 }));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .call(Method::GET, "/invoices?status=SENT", Some("staff"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn cancel_restores_stock_and_delete_is_draft_only() {
    let app = spawn_app().await;
    let first = app.create_invoice(4).await;
    let second = app.create_invoice(3).await;

    let id = first["id"].as_str().unwrap();
    let (status, body) = app
        .call(Method::PATCH, &format!("/invoices/{id}/cancel"), Some("admin"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let uri = format!("/invoices/{id}");
    let (status, body) = app.call(Method::DELETE, &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let id = second["id"].as_str().unwrap();
    let uri = format!("/invoices/{id}");
    let (status, _) = app.call(Method::DELETE, &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // All 10 laptops are back on the shelf.
    let body = app.create_invoice(10).await;
    assert_eq!(body["movements"][0]["stockAfter"], 0);
}
