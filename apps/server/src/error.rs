//! # API Error Handling
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl maps
//! the underlying failure to an HTTP status and a uniform JSON envelope:
//!
//! ```json
//! { "success": false, "message": "Stok tidak mencukupi untuk Amoxicillin" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! Validation / InsufficientStock / InsufficientCash /
//! DoctorIdentityRequired / ForeignKeyViolation     → 400 Bad Request
//! NotFound                                          → 404 Not Found
//! UniqueViolation                                   → 409 Conflict
//! everything else                                   → 500 (detail logged,
//!                                                     not leaked)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use apotek_db::DbError;

/// Error type crossing the handler boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// Request shape was fine but a referenced resource makes it unservable.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),

            ApiError::Db(db) => match db {
                DbError::Validation(_)
                | DbError::InsufficientStock { .. }
                | DbError::InsufficientCash { .. }
                | DbError::DoctorIdentityRequired { .. }
                | DbError::ForeignKeyViolation { .. } => {
                    (StatusCode::BAD_REQUEST, db.to_string())
                }

                DbError::NotFound { .. } => (StatusCode::NOT_FOUND, db.to_string()),

                DbError::UniqueViolation { .. } => (StatusCode::CONFLICT, db.to_string()),

                other => {
                    error!(error = %other, "Internal error serving request");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
