//! Stock and sales report handlers.
//!
//! Reports are computed on demand. There is no background job: the data is
//! always current as of the request, and a small pharmacy's tables are far
//! too small for these scans to matter.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use apotek_db::TopMedicine;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/reports/stock`
///
/// One payload for the dashboard: low-stock medicines, out-of-stock
/// medicines, and batches expiring inside the warning window.
pub async fn stock(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let low_stock = state.db.medicines().list_low_stock().await?;
    let out_of_stock = state.db.medicines().list_out_of_stock().await?;
    let expiring = state
        .db
        .batches()
        .list_expiring(state.config.expiry_warning_days)
        .await?;

    Ok(Json(json!({
        "low_stock": low_stock,
        "out_of_stock": out_of_stock,
        "expiring_batches": expiring,
    })))
}

#[derive(Debug, Deserialize)]
pub struct TopSellingParams {
    pub limit: Option<i64>,
}

/// `GET /api/reports/top-selling[?limit=10]`
pub async fn top_selling(
    State(state): State<AppState>,
    Query(params): Query<TopSellingParams>,
) -> Result<Json<Vec<TopMedicine>>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    Ok(Json(state.db.sales().top_selling(limit).await?))
}
