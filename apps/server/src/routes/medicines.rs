//! Catalog handlers: medicines, batches, categories, alternatives.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use apotek_core::types::{Category, MedicineBatch, MedicineStock};
use apotek_db::{MedicineHit, NewBatch, NewMedicine, SearchKind, UpdateMedicine};

use crate::error::ApiError;
use crate::notify::notify_waitlist;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub kind: SearchKind,
}

/// `GET /api/search/medicines?q=amoxi[&kind=name]`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MedicineHit>>, ApiError> {
    let hits = state.db.medicines().search(&params.q, params.kind).await?;
    Ok(Json(hits))
}

/// `GET /api/medicines`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<MedicineStock>>, ApiError> {
    Ok(Json(state.db.medicines().list().await?))
}

/// `POST /api/medicines`
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewMedicine>,
) -> Result<Json<MedicineStock>, ApiError> {
    Ok(Json(state.db.medicines().create(new).await?))
}

/// `GET /api/medicines/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MedicineStock>, ApiError> {
    Ok(Json(state.db.medicines().get(id).await?))
}

/// `PUT /api/medicines/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateMedicine>,
) -> Result<Json<MedicineStock>, ApiError> {
    Ok(Json(state.db.medicines().update(id, update).await?))
}

/// `DELETE /api/medicines/:id` (soft delete)
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.medicines().deactivate(id).await?;
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/medicines/:id/alternatives` — tiered matcher.
pub async fn alternatives(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MedicineHit>>, ApiError> {
    Ok(Json(state.db.medicines().alternatives_for(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AlternativesSearchParams {
    pub q: String,
    pub category_id: Option<i64>,
}

/// `GET /api/alternatives/search?q=amoxan[&category_id=3]`
///
/// Flat substring search across name, generic name, manufacturer, and
/// capacity. Separate path from the tiered per-medicine matcher.
pub async fn alternatives_search(
    State(state): State<AppState>,
    Query(params): Query<AlternativesSearchParams>,
) -> Result<Json<Vec<MedicineHit>>, ApiError> {
    let hits = state
        .db
        .medicines()
        .search_alternatives(&params.q, params.category_id)
        .await?;
    Ok(Json(hits))
}

/// `GET /api/medicines/:id/batches`
pub async fn list_batches(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MedicineBatch>>, ApiError> {
    // 404 for unknown medicine rather than an empty list
    state.db.medicines().get(id).await?;
    Ok(Json(state.db.batches().list_for_medicine(id).await?))
}

/// Batch intake body; the medicine comes from the path.
#[derive(Debug, Deserialize)]
pub struct AddBatchBody {
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    pub supplier: Option<String>,
    pub received_date: Option<NaiveDate>,
}

/// `POST /api/medicines/:id/batches`
///
/// Receiving stock for a medicine that was completely out triggers the
/// waitlist sweep: everyone still waiting gets a WhatsApp message, and the
/// response carries the dispatch report.
pub async fn add_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AddBatchBody>,
) -> Result<Json<Value>, ApiError> {
    let was_out = state.db.medicines().get(id).await?.is_out_of_stock();

    let batch = state
        .db
        .batches()
        .insert(NewBatch {
            medicine_id: id,
            batch_number: body.batch_number,
            expiry_date: body.expiry_date,
            quantity: body.quantity,
            purchase_price_cents: body.purchase_price_cents,
            supplier: body.supplier,
            received_date: body.received_date,
        })
        .await?;

    let restock = if was_out {
        Some(notify_waitlist(&state.db, &state.sender, id).await?)
    } else {
        None
    };

    Ok(Json(json!({ "batch": batch, "restock": restock })))
}

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.categories().list().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewCategoryBody {
    pub name: String,
    pub description: Option<String>,
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<NewCategoryBody>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .db
        .categories()
        .create(&body.name, body.description.as_deref())
        .await?;
    Ok(Json(category))
}

/// `PUT /api/categories/:id`
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewCategoryBody>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .db
        .categories()
        .update(id, &body.name, body.description.as_deref())
        .await?;
    Ok(Json(category))
}

/// `DELETE /api/categories/:id` — refused while medicines reference it.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.categories().delete(id).await?;
    Ok(Json(json!({ "success": true })))
}
