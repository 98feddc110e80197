//! Checkout handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use apotek_db::CreateSaleRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/sales` — the whole checkout in one atomic request.
///
/// The `success`/`sale_id`/`invoice_number` trio is the field set the POS
/// frontend keys on; the full sale header and line items ride along so the
/// receipt can render without a second request.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<Json<Value>, ApiError> {
    let sale = state.db.sales().create_sale(request).await?;
    let items = state.db.sales().get_items(sale.id).await?;
    Ok(Json(json!({
        "success": true,
        "sale_id": sale.id,
        "invoice_number": sale.invoice_number.clone(),
        "sale": sale,
        "items": items,
    })))
}

/// `GET /api/sales/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let sale = state.db.sales().get(id).await?;
    let items = state.db.sales().get_items(id).await?;
    Ok(Json(json!({ "sale": sale, "items": items })))
}

/// `GET /api/sales` — most recent sales.
pub async fn recent(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sales = state.db.sales().recent(state.config.list_limit).await?;
    Ok(Json(json!({ "sales": sales })))
}
