//! Prescription intake and processing handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use apotek_core::types::Prescription;
use apotek_db::{NewPrescription, ProcessOutcome};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/prescriptions`
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewPrescription>,
) -> Result<Json<Value>, ApiError> {
    let (prescription, items) = state.db.prescriptions().create(new).await?;
    Ok(Json(json!({ "prescription": prescription, "items": items })))
}

/// `GET /api/prescriptions/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let (prescription, items) = state.db.prescriptions().get_with_items(id).await?;
    Ok(Json(json!({ "prescription": prescription, "items": items })))
}

/// `POST /api/prescriptions/:id/process`
///
/// Re-checks availability, waitlists the customer for lines stock cannot
/// cover, and marks the prescription processed.
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProcessOutcome>, ApiError> {
    Ok(Json(state.db.prescriptions().process(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// `GET /api/search/prescriptions?q=RX-...` — number or customer name.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    Ok(Json(state.db.prescriptions().search(&params.q).await?))
}
