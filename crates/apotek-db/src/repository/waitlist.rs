//! # Waitlist Repository
//!
//! Customers waiting for out-of-stock medicines.
//!
//! One row per (customer, medicine) pair. Re-registering interest never
//! inserts a second row: it raises `quantity_needed` to the larger of the
//! old and new request and clears the notified flag, so a customer who was
//! already messaged about an earlier restock becomes pending again.

use apotek_core::types::WaitlistEntry;
use apotek_core::validation::validate_quantity;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A pending waitlist entry joined with the customer contact details the
/// notifier needs.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PendingWaiter {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub entry: WaitlistEntry,
    pub customer_name: String,
    pub customer_whatsapp: Option<String>,
}

/// Per-medicine rollup for the waitlist overview screen.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WaitlistSummary {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub pending_customers: i64,
    pub total_quantity_needed: i64,
}

/// Repository for the customer waitlist.
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    pool: SqlitePool,
}

impl WaitlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WaitlistRepository { pool }
    }

    /// Registers (or refreshes) a customer's interest in a medicine.
    pub async fn add_or_update(
        &self,
        customer_id: i64,
        medicine_id: i64,
        quantity_needed: i64,
        notes: Option<&str>,
    ) -> DbResult<WaitlistEntry> {
        validate_quantity(quantity_needed)?;

        let entry = sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO customer_waitlist \
             (customer_id, medicine_id, quantity_needed, notes, is_notified, created_at) \
             VALUES (?, ?, ?, ?, 0, ?) \
             ON CONFLICT (customer_id, medicine_id) DO UPDATE SET \
                 quantity_needed = MAX(quantity_needed, excluded.quantity_needed), \
                 notes = COALESCE(excluded.notes, notes), \
                 is_notified = 0, \
                 notified_at = NULL \
             RETURNING *",
        )
        .bind(customer_id)
        .bind(medicine_id)
        .bind(quantity_needed)
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(customer_id, medicine_id, quantity_needed, "Waitlist entry upserted");
        Ok(entry)
    }

    /// Pending (not yet notified) waiters for one medicine, oldest first,
    /// with the contact details needed to message them.
    pub async fn pending_for_medicine(&self, medicine_id: i64) -> DbResult<Vec<PendingWaiter>> {
        let rows = sqlx::query_as::<_, PendingWaiter>(
            "SELECT w.*, c.name AS customer_name, c.whatsapp AS customer_whatsapp \
             FROM customer_waitlist w \
             JOIN customers c ON c.id = w.customer_id \
             WHERE w.medicine_id = ? AND w.is_notified = 0 \
             ORDER BY w.created_at, w.id",
        )
        .bind(medicine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of pending waiters for one medicine.
    pub async fn pending_count_for_medicine(&self, medicine_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customer_waitlist WHERE medicine_id = ? AND is_notified = 0",
        )
        .bind(medicine_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Fetches one entry with its customer contact details, notified or not.
    /// The individual re-notify endpoint needs the flag to refuse repeats.
    pub async fn get_waiter(&self, entry_id: i64) -> DbResult<PendingWaiter> {
        sqlx::query_as::<_, PendingWaiter>(
            "SELECT w.*, c.name AS customer_name, c.whatsapp AS customer_whatsapp \
             FROM customer_waitlist w \
             JOIN customers c ON c.id = w.customer_id \
             WHERE w.id = ?",
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Waitlist entry", entry_id))
    }

    /// Marks one entry as notified. Called only after a message actually
    /// went out; failed sends leave the row pending for the next restock.
    pub async fn mark_notified(&self, entry_id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customer_waitlist SET is_notified = 1, notified_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(entry_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Waitlist entry", entry_id));
        }
        Ok(())
    }

    /// All pending entries across medicines, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<PendingWaiter>> {
        let rows = sqlx::query_as::<_, PendingWaiter>(
            "SELECT w.*, c.name AS customer_name, c.whatsapp AS customer_whatsapp \
             FROM customer_waitlist w \
             JOIN customers c ON c.id = w.customer_id \
             WHERE w.is_notified = 0 \
             ORDER BY w.created_at, w.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Pending demand grouped by medicine, most-wanted first.
    pub async fn summary_by_medicine(&self) -> DbResult<Vec<WaitlistSummary>> {
        let rows = sqlx::query_as::<_, WaitlistSummary>(
            "SELECT w.medicine_id AS medicine_id, m.name AS medicine_name, \
                    COUNT(*) AS pending_customers, \
                    SUM(w.quantity_needed) AS total_quantity_needed \
             FROM customer_waitlist w \
             JOIN medicines m ON m.id = w.medicine_id \
             WHERE w.is_notified = 0 \
             GROUP BY w.medicine_id, m.name \
             ORDER BY pending_customers DESC, m.name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
