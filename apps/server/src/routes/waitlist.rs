//! Waitlist handlers: registration, overview, and the manual restock sweep.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use apotek_db::{CustomerInfo, PendingWaiter, WaitlistSummary};

use crate::error::ApiError;
use crate::notify::{notify_waiter, notify_waitlist};
use crate::state::AppState;

/// Registration body: full customer details (upserted by NIK) plus what
/// they are waiting for.
#[derive(Debug, Deserialize)]
pub struct AddWaitlistBody {
    pub customer: CustomerInfo,
    pub medicine_id: i64,
    pub quantity_needed: i64,
    pub notes: Option<String>,
}

/// `POST /api/waitlist`
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddWaitlistBody>,
) -> Result<Json<Value>, ApiError> {
    // 404 before touching the customer when the medicine id is bogus
    state.db.medicines().get(body.medicine_id).await?;

    let customer = state.db.customers().upsert_by_nik(&body.customer).await?;
    let entry = state
        .db
        .waitlist()
        .add_or_update(
            customer.id,
            body.medicine_id,
            body.quantity_needed,
            body.notes.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "entry": entry, "customer": customer })))
}

/// `GET /api/waitlist` — pending demand grouped by medicine.
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<WaitlistSummary>>, ApiError> {
    Ok(Json(state.db.waitlist().summary_by_medicine().await?))
}

/// `GET /api/waitlist/pending` — every pending entry with contact details.
pub async fn pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingWaiter>>, ApiError> {
    Ok(Json(state.db.waitlist().list_pending().await?))
}

/// `POST /api/medicines/:id/notify` — manual restock sweep, for when staff
/// want to re-run dispatch (e.g. after fixing a customer's number).
pub async fn notify(
    State(state): State<AppState>,
    Path(medicine_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let report = notify_waitlist(&state.db, &state.sender, medicine_id).await?;
    Ok(Json(json!({ "restock": report })))
}

/// `POST /api/waitlist/:id/notify` — message one waiter. Refused when the
/// entry was already notified; re-registering interest resets it.
pub async fn notify_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let waiter = state.db.waitlist().get_waiter(id).await?;
    if waiter.entry.is_notified {
        return Err(ApiError::BadRequest(
            "Pelanggan sudah diberi tahu untuk obat ini".to_string(),
        ));
    }

    let sent = notify_waiter(&state.db, &state.sender, &waiter).await?;
    Ok(Json(json!({ "success": sent })))
}
