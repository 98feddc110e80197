//! End-to-end exercises of the JSON API through the router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use apotek_db::{Database, DbConfig};
use apotek_server::notify::ConsoleSender;
use apotek_server::routes;
use apotek_server::{AppState, ServerConfig};

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let state = AppState::new(db, Arc::new(ConsoleSender), ServerConfig::load().unwrap());
    routes::router(state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Seeds one category + one stocked medicine over HTTP; returns the
/// medicine id.
async fn seed_stocked_medicine(app: &Router, stock: i64) -> i64 {
    let (status, category) = call(
        app,
        "POST",
        "/api/categories",
        Some(json!({ "name": "Antibiotik" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, medicine) = call(
        app,
        "POST",
        "/api/medicines",
        Some(json!({
            "name": "Amoxicillin 500mg",
            "generic_name": "Amoxicillin",
            "category_id": category["id"],
            "unit": "kapsul",
            "capacity": "500mg",
            "purchase_price_cents": 500000,
            "selling_price_cents": 900000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = medicine["id"].as_i64().unwrap();

    if stock > 0 {
        let expiry = (chrono::Utc::now().date_naive() + chrono::Duration::days(180)).to_string();
        let (status, _) = call(
            app,
            "POST",
            &format!("/api/medicines/{id}/batches"),
            Some(json!({
                "batch_number": "B-1",
                "expiry_date": expiry,
                "quantity": stock,
                "purchase_price_cents": 500000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    id
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn medicine_payload_shape_is_stable() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 40).await;

    let (status, body) = call(&app, "GET", &format!("/api/medicines/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // MedicineStock flattens the medicine fields next to total_quantity
    assert_eq!(body["name"], "Amoxicillin 500mg");
    assert_eq!(body["total_quantity"], 40);
    assert_eq!(body["capacity_numeric"], 500.0);
    assert!(body["barcode_id"].as_str().unwrap().starts_with("APT"));
}

#[tokio::test]
async fn search_finds_by_generic_name() {
    let app = test_app().await;
    seed_stocked_medicine(&app, 40).await;

    let (status, body) = call(&app, "GET", "/api/search/medicines?q=amoxi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    // Wire field names the frontend keys on
    assert_eq!(body[0]["stock"], 40);
    assert_eq!(body[0]["price"], 900_000);
    assert_eq!(body[0]["category"], "Antibiotik");

    let (_, empty) = call(&app, "GET", "/api/search/medicines?q=zzz", None).await;
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sale_over_http_returns_receipt() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 40).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer": { "name": "Ibu Sari", "nik": "3201011503900001",
                          "whatsapp": "08123456789" },
            "items": [ { "medicine_id": id, "quantity": 3 } ],
            "payment_method": "cash",
            "cash_cents": 5000000,
            "cashier": "kasir1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["sale_id"].as_i64().unwrap() > 0);
    assert!(body["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(body["sale"]["total_cents"], 2_700_000);
    assert_eq!(body["sale"]["change_cents"], 2_300_000);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // Stock visibly decremented
    let (_, medicine) = call(&app, "GET", &format!("/api/medicines/{id}"), None).await;
    assert_eq!(medicine["total_quantity"], 37);
}

#[tokio::test]
async fn insufficient_stock_is_a_400_with_message() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 2).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer": { "name": "Ibu Sari", "nik": "3201011503900001" },
            "items": [ { "medicine_id": id, "quantity": 10 } ],
            "cashier": "kasir1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Stok tidak mencukupi untuk Amoxicillin 500mg");
}

#[tokio::test]
async fn unknown_medicine_is_a_404() {
    let app = test_app().await;
    let (status, body) = call(&app, "GET", "/api/medicines/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn restock_through_batch_intake_notifies_waitlist() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 0).await;

    // Customer registers interest while the medicine is out
    let (status, _) = call(
        &app,
        "POST",
        "/api/waitlist",
        Some(json!({
            "customer": { "name": "Ibu Sari", "nik": "3201011503900001",
                          "whatsapp": "08123456789" },
            "medicine_id": id,
            "quantity_needed": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Stock arrives: intake on a zero-stock medicine runs the sweep
    let expiry = (chrono::Utc::now().date_naive() + chrono::Duration::days(90)).to_string();
    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/medicines/{id}/batches"),
        Some(json!({
            "batch_number": "B-NEW",
            "expiry_date": expiry,
            "quantity": 25,
            "purchase_price_cents": 500000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restock"]["notified"], 1);
    assert_eq!(body["restock"]["failed"], 0);

    // Waitlist drained, audit notification recorded
    let (_, pending) = call(&app, "GET", "/api/waitlist/pending", None).await;
    assert!(pending.as_array().unwrap().is_empty());
    let (_, unread) = call(&app, "GET", "/api/notifications/unread-count", None).await;
    assert_eq!(unread["unread"], 1);
}

#[tokio::test]
async fn batch_intake_with_stock_left_skips_the_sweep() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 10).await;

    let expiry = (chrono::Utc::now().date_naive() + chrono::Duration::days(90)).to_string();
    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/medicines/{id}/batches"),
        Some(json!({
            "batch_number": "B-2",
            "expiry_date": expiry,
            "quantity": 25,
            "purchase_price_cents": 500000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["restock"].is_null());
}

#[tokio::test]
async fn alternatives_search_is_flat_across_categories() {
    let app = test_app().await;
    seed_stocked_medicine(&app, 40).await;

    // Same generic, stocked: a flat-search hit regardless of tiering
    let (_, category) = call(&app, "GET", "/api/categories", None).await;
    let category_id = category[0]["id"].clone();
    let (status, other) = call(
        &app,
        "POST",
        "/api/medicines",
        Some(json!({
            "name": "Intermoxil",
            "generic_name": "Amoxicillin",
            "category_id": category_id,
            "unit": "kapsul",
            "capacity": "450mg",
            "purchase_price_cents": 400000,
            "selling_price_cents": 800000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let other_id = other["id"].as_i64().unwrap();
    let expiry = (chrono::Utc::now().date_naive() + chrono::Duration::days(90)).to_string();
    call(
        &app,
        "POST",
        &format!("/api/medicines/{other_id}/batches"),
        Some(json!({
            "batch_number": "B-ALT",
            "expiry_date": expiry,
            "quantity": 15,
            "purchase_price_cents": 400000
        })),
    )
    .await;

    let (status, body) = call(&app, "GET", "/api/alternatives/search?q=Amoxicillin", None).await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    // Ordered by name; stock and price ride along for the picker UI
    assert_eq!(hits[0]["name"], "Amoxicillin 500mg");
    assert_eq!(hits[1]["name"], "Intermoxil");
    assert_eq!(hits[1]["stock"], 15);

    // Scoping to a category the hits are not in empties the result
    let (status, empty) =
        call(&app, "GET", "/api/alternatives/search?q=Amoxicillin&category_id=999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn individual_notify_refuses_repeat() {
    let app = test_app().await;
    let id = seed_stocked_medicine(&app, 0).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/waitlist",
        Some(json!({
            "customer": { "name": "Ibu Sari", "nik": "3201011503900001",
                          "whatsapp": "08123456789" },
            "medicine_id": id,
            "quantity_needed": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entry_id = body["entry"]["id"].as_i64().unwrap();

    // ConsoleSender always delivers, so the first poke marks the entry
    let (status, body) =
        call(&app, "POST", &format!("/api/waitlist/{entry_id}/notify"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // A second poke is refused until the customer re-registers
    let (status, body) =
        call(&app, "POST", &format!("/api/waitlist/{entry_id}/notify"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
