//! # Batch Repository
//!
//! Stock intake and the batch allocator.
//!
//! ## Allocation Rule
//! A sale line is served from exactly ONE batch: the earliest-expiring batch
//! whose remaining quantity covers the whole line (first-expiry-first-out).
//! Lines are never split across batches, so a request for 30 units fails
//! with insufficient stock even when two batches of 20 exist.
//!
//! ## Concurrency
//! The decrement is a conditional UPDATE:
//! ```sql
//! UPDATE medicine_batches SET quantity = quantity - :n
//! WHERE id = :id AND quantity >= :n
//! ```
//! Zero rows affected means another sale drained the batch between the
//! allocator's read and this write; the caller treats that as insufficient
//! stock and rolls back. Stock can never go negative.

use apotek_core::types::MedicineBatch;
use apotek_core::validation::{validate_expiry, validate_quantity};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Input for receiving a batch into stock.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub medicine_id: i64,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    pub supplier: Option<String>,
    /// Defaults to today when omitted.
    pub received_date: Option<NaiveDate>,
}

/// Repository for medicine batches.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Receives a batch into stock.
    ///
    /// The expiry date must be strictly in the future; a batch expiring
    /// today could never be allocated and would only pollute reports.
    pub async fn insert(&self, new: NewBatch) -> DbResult<MedicineBatch> {
        let today = Utc::now().date_naive();
        validate_quantity(new.quantity)?;
        validate_expiry(new.expiry_date, today)?;

        let result = sqlx::query(
            "INSERT INTO medicine_batches \
             (medicine_id, batch_number, expiry_date, quantity, \
              purchase_price_cents, supplier, received_date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.medicine_id)
        .bind(new.batch_number.trim())
        .bind(new.expiry_date)
        .bind(new.quantity)
        .bind(new.purchase_price_cents)
        .bind(&new.supplier)
        .bind(new.received_date.unwrap_or(today))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(
            medicine_id = new.medicine_id,
            quantity = new.quantity,
            "Batch received"
        );
        self.get(result.last_insert_rowid()).await
    }

    /// Fetches a batch by id.
    pub async fn get(&self, id: i64) -> DbResult<MedicineBatch> {
        sqlx::query_as::<_, MedicineBatch>("SELECT * FROM medicine_batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", id))
    }

    /// All batches of a medicine, soonest expiry first. Includes expired and
    /// drained batches for the audit view.
    pub async fn list_for_medicine(&self, medicine_id: i64) -> DbResult<Vec<MedicineBatch>> {
        let rows = sqlx::query_as::<_, MedicineBatch>(
            "SELECT * FROM medicine_batches WHERE medicine_id = ? ORDER BY expiry_date",
        )
        .bind(medicine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Non-empty batches expiring within `days` from today (today-or-past
    /// included, so already-expired leftovers surface too).
    pub async fn list_expiring(&self, days: i64) -> DbResult<Vec<MedicineBatch>> {
        let today = Utc::now().date_naive();
        let horizon = today + chrono::Duration::days(days);
        let rows = sqlx::query_as::<_, MedicineBatch>(
            "SELECT * FROM medicine_batches \
             WHERE quantity > 0 AND expiry_date <= ? \
             ORDER BY expiry_date",
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Sellable stock total for one medicine.
    pub async fn total_stock(&self, medicine_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM medicine_batches \
             WHERE medicine_id = ? AND quantity > 0 AND expiry_date > ?",
        )
        .bind(medicine_id)
        .bind(Utc::now().date_naive())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    // =========================================================================
    // Allocation (transaction-scoped)
    // =========================================================================

    /// Picks the batch a sale line should draw from: earliest expiry among
    /// unexpired batches that can cover the full quantity.
    ///
    /// Takes a connection so it can run inside the sale transaction.
    pub async fn find_allocatable(
        conn: &mut SqliteConnection,
        medicine_id: i64,
        quantity: i64,
        today: NaiveDate,
    ) -> DbResult<Option<MedicineBatch>> {
        let batch = sqlx::query_as::<_, MedicineBatch>(
            "SELECT * FROM medicine_batches \
             WHERE medicine_id = ? AND quantity >= ? AND expiry_date > ? \
             ORDER BY expiry_date \
             LIMIT 1",
        )
        .bind(medicine_id)
        .bind(quantity)
        .bind(today)
        .fetch_optional(conn)
        .await?;
        Ok(batch)
    }

    /// Conditionally decrements a batch. Returns `false` when the batch no
    /// longer holds `quantity` units, in which case nothing was written.
    pub async fn decrement(
        conn: &mut SqliteConnection,
        batch_id: i64,
        quantity: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE medicine_batches SET quantity = quantity - ? \
             WHERE id = ? AND quantity >= ?",
        )
        .bind(quantity)
        .bind(batch_id)
        .bind(quantity)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::medicine::NewMedicine;
    use chrono::Duration;

    async fn seed_medicine(db: &Database) -> i64 {
        let cat = db.categories().create("Analgesik", None).await.unwrap();
        db.medicines()
            .create(NewMedicine {
                barcode_id: None,
                name: "Paracetamol".to_string(),
                generic_name: None,
                category_id: cat.id,
                manufacturer: None,
                unit: "tablet".to_string(),
                capacity: None,
                minimum_stock: None,
                purchase_price_cents: 5_000_00,
                selling_price_cents: 8_000_00,
                description: None,
                storage_location: None,
                image_url: None,
            })
            .await
            .unwrap()
            .medicine
            .id
    }

    fn batch(medicine_id: i64, number: &str, quantity: i64, days_out: i64) -> NewBatch {
        NewBatch {
            medicine_id,
            batch_number: number.to_string(),
            expiry_date: Utc::now().date_naive() + Duration::days(days_out),
            quantity,
            purchase_price_cents: 5_000_00,
            supplier: None,
            received_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_past_expiry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = seed_medicine(&db).await;

        let err = db.batches().insert(batch(id, "B-1", 10, 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = db.batches().insert(batch(id, "B-2", 10, -5)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_medicine() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.batches().insert(batch(999, "B-1", 10, 30)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_allocator_prefers_earliest_expiry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = seed_medicine(&db).await;

        db.batches().insert(batch(id, "LATE", 50, 180)).await.unwrap();
        let early = db.batches().insert(batch(id, "EARLY", 50, 30)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let chosen = BatchRepository::find_allocatable(&mut conn, id, 10, Utc::now().date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chosen.id, early.id);
    }

    #[tokio::test]
    async fn test_allocator_never_splits_across_batches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = seed_medicine(&db).await;

        db.batches().insert(batch(id, "A", 20, 30)).await.unwrap();
        db.batches().insert(batch(id, "B", 20, 60)).await.unwrap();

        // 40 on hand, but no single batch covers 30
        let mut conn = db.pool().acquire().await.unwrap();
        let chosen = BatchRepository::find_allocatable(&mut conn, id, 30, Utc::now().date_naive())
            .await
            .unwrap();
        assert!(chosen.is_none());
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = seed_medicine(&db).await;
        let b = db.batches().insert(batch(id, "B-1", 10, 30)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(BatchRepository::decrement(&mut conn, b.id, 7).await.unwrap());
        // Only 3 left: a second take of 7 writes nothing
        assert!(!BatchRepository::decrement(&mut conn, b.id, 7).await.unwrap());
        drop(conn); // single-connection test pool

        let after = db.batches().get(b.id).await.unwrap();
        assert_eq!(after.quantity, 3);
    }

    #[tokio::test]
    async fn test_expiring_report_includes_already_expired() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = seed_medicine(&db).await;

        db.batches().insert(batch(id, "SOON", 5, 10)).await.unwrap();
        db.batches().insert(batch(id, "FAR", 5, 120)).await.unwrap();

        let expiring = db.batches().list_expiring(14).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].batch_number, "SOON");
    }
}
