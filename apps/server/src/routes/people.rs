//! Customer and doctor lookup handlers for the POS autocomplete fields.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use apotek_core::types::{Customer, Doctor};
use apotek_db::DoctorInfo;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// `GET /api/search/customers?q=sari` — matches name or NIK fragment.
pub async fn search_customers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.db.customers().search(&params.q).await?))
}

/// `GET /api/search/doctors?q=budi` — matches name, STR number, or clinic.
pub async fn search_doctors(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    Ok(Json(state.db.doctors().search(&params.q).await?))
}

/// `POST /api/doctors` — registration outside the sale flow; the STR number
/// is mandatory here too.
pub async fn create_doctor(
    State(state): State<AppState>,
    Json(info): Json<DoctorInfo>,
) -> Result<Json<Doctor>, ApiError> {
    Ok(Json(state.db.doctors().create(&info).await?))
}
