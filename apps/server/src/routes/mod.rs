//! # HTTP Routes
//!
//! Route table for the POS frontend. Handlers stay thin: deserialize, call a
//! repository (or the restock dispatcher), serialize.

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub mod medicines;
pub mod notifications;
pub mod people;
pub mod prescriptions;
pub mod reports;
pub mod sales;
pub mod waitlist;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Catalog
        .route("/api/search/medicines", get(medicines::search))
        .route("/api/medicines", get(medicines::list).post(medicines::create))
        .route(
            "/api/medicines/:id",
            get(medicines::get)
                .put(medicines::update)
                .delete(medicines::deactivate),
        )
        .route("/api/medicines/:id/alternatives", get(medicines::alternatives))
        .route("/api/alternatives/search", get(medicines::alternatives_search))
        .route(
            "/api/medicines/:id/batches",
            get(medicines::list_batches).post(medicines::add_batch),
        )
        .route("/api/medicines/:id/notify", post(waitlist::notify))
        .route(
            "/api/categories",
            get(medicines::list_categories).post(medicines::create_category),
        )
        .route(
            "/api/categories/:id",
            put(medicines::update_category).delete(medicines::delete_category),
        )
        // People
        .route("/api/search/customers", get(people::search_customers))
        .route("/api/search/doctors", get(people::search_doctors))
        .route("/api/doctors", post(people::create_doctor))
        // Checkout
        .route("/api/sales", get(sales::recent).post(sales::create))
        .route("/api/sales/:id", get(sales::get))
        // Waitlist
        .route("/api/waitlist", get(waitlist::summary).post(waitlist::add))
        .route("/api/waitlist/pending", get(waitlist::pending))
        .route("/api/waitlist/:id/notify", post(waitlist::notify_one))
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        // Prescriptions
        .route("/api/prescriptions", post(prescriptions::create))
        .route("/api/prescriptions/:id", get(prescriptions::get))
        .route("/api/prescriptions/:id/process", post(prescriptions::process))
        .route("/api/search/prescriptions", get(prescriptions::search))
        // Reports
        .route("/api/reports/stock", get(reports::stock))
        .route("/api/reports/top-selling", get(reports::top_selling))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check: verifies a query can reach the database.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.health_check().await {
        return Err(ApiError::Db(apotek_db::DbError::ConnectionFailed(
            "health check query failed".to_string(),
        )));
    }
    Ok(Json(json!({ "status": "ok" })))
}
