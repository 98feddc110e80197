//! # Prescription Repository
//!
//! Prescription (resep) intake and processing.
//!
//! Intake matches each prescribed name against the catalog and records
//! availability per line. Processing re-checks availability and hands
//! unavailable lines to the waitlist, so the customer is messaged when the
//! medicine comes back; the prescription itself then moves to `processed`.

use apotek_core::types::{Prescription, PrescriptionItem, PrescriptionStatus};
use apotek_core::validation::validate_quantity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// DTOs
// =============================================================================

/// One prescribed line as written on the resep.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescriptionItem {
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub quantity: i64,
    pub instructions: Option<String>,
}

/// Input for taking in a prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub customer_id: i64,
    pub doctor_id: i64,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    /// Date written on the prescription; defaults to today.
    pub prescription_date: Option<NaiveDate>,
    pub items: Vec<NewPrescriptionItem>,
}

/// Outcome of processing one prescription.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessOutcome {
    pub prescription: Prescription,
    pub items: Vec<PrescriptionItem>,
    /// Line count handed to the waitlist because stock could not cover them.
    pub waitlisted: usize,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for prescriptions.
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionRepository { pool }
    }

    /// Takes in a prescription, matching each line to the catalog.
    ///
    /// Lines whose name has no catalog match keep `medicine_id = NULL` and
    /// count as unavailable; the pharmacist resolves them by hand.
    pub async fn create(&self, new: NewPrescription) -> DbResult<(Prescription, Vec<PrescriptionItem>)> {
        if new.items.is_empty() {
            return Err(DbError::QueryFailed("prescription has no items".to_string()));
        }
        for item in &new.items {
            validate_quantity(item.quantity)?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let prescription = sqlx::query_as::<_, Prescription>(
            "INSERT INTO prescriptions \
             (prescription_number, customer_id, doctor_id, diagnosis, notes, status, \
              prescription_date, created_at) \
             VALUES (?, ?, ?, ?, ?, 'pending', ?, ?) \
             RETURNING *",
        )
        .bind(prescription_number(now))
        .bind(new.customer_id)
        .bind(new.doctor_id)
        .bind(&new.diagnosis)
        .bind(&new.notes)
        .bind(new.prescription_date.unwrap_or(now.date_naive()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            let medicine_id = match_catalog_name(&mut tx, &line.medicine_name).await?;
            let available = match medicine_id {
                Some(id) => sellable_stock(&mut tx, id, now.date_naive()).await? >= line.quantity,
                None => false,
            };

            let item = sqlx::query_as::<_, PrescriptionItem>(
                "INSERT INTO prescription_items \
                 (prescription_id, medicine_id, medicine_name, dosage, quantity, \
                  instructions, is_available, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
                 RETURNING *",
            )
            .bind(prescription.id)
            .bind(medicine_id)
            .bind(line.medicine_name.trim())
            .bind(&line.dosage)
            .bind(line.quantity)
            .bind(&line.instructions)
            .bind(available)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(
            number = %prescription.prescription_number,
            items = items.len(),
            "Prescription taken in"
        );
        Ok((prescription, items))
    }

    /// Processes a pending prescription: re-checks availability per line,
    /// waitlists the customer for matched-but-unavailable lines, and marks
    /// the prescription processed.
    pub async fn process(&self, id: i64) -> DbResult<ProcessOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let prescription = sqlx::query_as::<_, Prescription>(
            "SELECT * FROM prescriptions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Prescription", id))?;

        if prescription.status == PrescriptionStatus::Processed {
            return Err(DbError::QueryFailed(format!(
                "prescription {} is already processed",
                prescription.prescription_number
            )));
        }

        let items = sqlx::query_as::<_, PrescriptionItem>(
            "SELECT * FROM prescription_items WHERE prescription_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let mut waitlisted = 0;
        let mut updated_items = Vec::with_capacity(items.len());
        for item in items {
            let available = match item.medicine_id {
                Some(medicine_id) => {
                    sellable_stock(&mut tx, medicine_id, now.date_naive()).await? >= item.quantity
                }
                None => false,
            };

            if !available {
                if let Some(medicine_id) = item.medicine_id {
                    // Same upsert the waitlist screen uses, inside this tx
                    sqlx::query(
                        "INSERT INTO customer_waitlist \
                         (customer_id, medicine_id, quantity_needed, notes, is_notified, created_at) \
                         VALUES (?, ?, ?, ?, 0, ?) \
                         ON CONFLICT (customer_id, medicine_id) DO UPDATE SET \
                             quantity_needed = MAX(quantity_needed, excluded.quantity_needed), \
                             notes = COALESCE(excluded.notes, notes), \
                             is_notified = 0, \
                             notified_at = NULL",
                    )
                    .bind(prescription.customer_id)
                    .bind(medicine_id)
                    .bind(item.quantity)
                    .bind(format!("Resep {}", prescription.prescription_number))
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                    waitlisted += 1;
                    debug!(
                        medicine_id,
                        prescription = %prescription.prescription_number,
                        "Unavailable line waitlisted"
                    );
                }
            }

            let updated = sqlx::query_as::<_, PrescriptionItem>(
                "UPDATE prescription_items SET is_available = ? WHERE id = ? RETURNING *",
            )
            .bind(available)
            .bind(item.id)
            .fetch_one(&mut *tx)
            .await?;
            updated_items.push(updated);
        }

        let prescription = sqlx::query_as::<_, Prescription>(
            "UPDATE prescriptions SET status = 'processed', processed_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            number = %prescription.prescription_number,
            waitlisted,
            "Prescription processed"
        );
        Ok(ProcessOutcome {
            prescription,
            items: updated_items,
            waitlisted,
        })
    }

    /// Records a substitution dispensed for one line.
    pub async fn record_substitution(
        &self,
        item_id: i64,
        substitution_medicine_id: i64,
        notes: Option<&str>,
    ) -> DbResult<PrescriptionItem> {
        sqlx::query_as::<_, PrescriptionItem>(
            "UPDATE prescription_items \
             SET substitution_medicine_id = ?, substitution_notes = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(substitution_medicine_id)
        .bind(notes)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Prescription item", item_id))
    }

    /// Fetches a prescription with its items.
    pub async fn get_with_items(&self, id: i64) -> DbResult<(Prescription, Vec<PrescriptionItem>)> {
        let prescription =
            sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("Prescription", id))?;

        let items = sqlx::query_as::<_, PrescriptionItem>(
            "SELECT * FROM prescription_items WHERE prescription_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok((prescription, items))
    }

    /// Searches by prescription number or customer name.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Prescription>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, Prescription>(
            "SELECT p.* FROM prescriptions p \
             JOIN customers c ON c.id = p.customer_id \
             WHERE p.prescription_number LIKE ? OR c.name LIKE ? \
             ORDER BY p.created_at DESC LIMIT 20",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// `RX-YYYYMMDD-XXXXXXXX`, same shape as invoice numbers.
fn prescription_number(now: DateTime<Utc>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("RX-{}-{}", now.format("%Y%m%d"), id[..8].to_uppercase())
}

/// Exact (case-insensitive) catalog match for a prescribed name.
async fn match_catalog_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<i64>> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM medicines WHERE name = ? COLLATE NOCASE AND is_active = 1",
    )
    .bind(name.trim())
    .fetch_optional(conn)
    .await?;
    Ok(id)
}

/// Sellable stock for one medicine as of `today`.
async fn sellable_stock(
    conn: &mut SqliteConnection,
    medicine_id: i64,
    today: NaiveDate,
) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM medicine_batches \
         WHERE medicine_id = ? AND quantity > 0 AND expiry_date > ?",
    )
    .bind(medicine_id)
    .bind(today)
    .fetch_one(conn)
    .await?;
    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::batch::NewBatch;
    use crate::repository::customer::CustomerInfo;
    use crate::repository::doctor::DoctorInfo;
    use crate::repository::medicine::NewMedicine;
    use chrono::Duration;

    struct Fixture {
        customer_id: i64,
        doctor_id: i64,
        stocked_id: i64,
    }

    async fn seed(db: &Database) -> Fixture {
        let customer = db
            .customers()
            .upsert_by_nik(&CustomerInfo {
                name: "Ibu Sari".to_string(),
                nik: "3201011503900001".to_string(),
                phone: None,
                whatsapp: Some("08123456789".to_string()),
                address: None,
            })
            .await
            .unwrap();
        let doctor = db
            .doctors()
            .create(&DoctorInfo {
                name: "dr. Budi".to_string(),
                str_number: Some("STR-1".to_string()),
                specialization: None,
                phone: None,
                whatsapp: None,
                hospital_clinic: None,
            })
            .await
            .unwrap();

        let category = db.categories().get_or_create("Antibiotik").await.unwrap();
        let stocked = db
            .medicines()
            .create(NewMedicine {
                barcode_id: None,
                name: "Amoxicillin".to_string(),
                generic_name: None,
                category_id: category.id,
                manufacturer: None,
                unit: "kapsul".to_string(),
                capacity: None,
                minimum_stock: None,
                purchase_price_cents: 5_000_00,
                selling_price_cents: 9_000_00,
                description: None,
                storage_location: None,
                image_url: None,
            })
            .await
            .unwrap()
            .medicine;
        db.batches()
            .insert(NewBatch {
                medicine_id: stocked.id,
                batch_number: "B-1".to_string(),
                expiry_date: Utc::now().date_naive() + Duration::days(180),
                quantity: 30,
                purchase_price_cents: 5_000_00,
                supplier: None,
                received_date: None,
            })
            .await
            .unwrap();

        // Known medicine with no stock at all
        db.medicines()
            .create(NewMedicine {
                barcode_id: None,
                name: "Cefixime".to_string(),
                generic_name: None,
                category_id: category.id,
                manufacturer: None,
                unit: "kapsul".to_string(),
                capacity: None,
                minimum_stock: None,
                purchase_price_cents: 8_000_00,
                selling_price_cents: 14_000_00,
                description: None,
                storage_location: None,
                image_url: None,
            })
            .await
            .unwrap();

        Fixture {
            customer_id: customer.id,
            doctor_id: doctor.id,
            stocked_id: stocked.id,
        }
    }

    fn line(name: &str, quantity: i64) -> NewPrescriptionItem {
        NewPrescriptionItem {
            medicine_name: name.to_string(),
            dosage: Some("3x1".to_string()),
            quantity,
            instructions: None,
        }
    }

    #[tokio::test]
    async fn test_intake_matches_catalog_and_availability() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = seed(&db).await;

        let (prescription, items) = db
            .prescriptions()
            .create(NewPrescription {
                customer_id: fx.customer_id,
                doctor_id: fx.doctor_id,
                diagnosis: None,
                notes: None,
                prescription_date: None,
                items: vec![
                    line("amoxicillin", 10),  // matched, in stock
                    line("Cefixime", 5),      // matched, no stock
                    line("Obat Ajaib", 1),    // no catalog match
                ],
            })
            .await
            .unwrap();

        assert!(prescription.prescription_number.starts_with("RX-"));
        assert_eq!(prescription.status, PrescriptionStatus::Pending);

        assert_eq!(items[0].medicine_id, Some(fx.stocked_id));
        assert!(items[0].is_available);
        assert!(items[1].medicine_id.is_some());
        assert!(!items[1].is_available);
        assert!(items[2].medicine_id.is_none());
        assert!(!items[2].is_available);
    }

    #[tokio::test]
    async fn test_process_waitlists_unavailable_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = seed(&db).await;

        let (prescription, _) = db
            .prescriptions()
            .create(NewPrescription {
                customer_id: fx.customer_id,
                doctor_id: fx.doctor_id,
                diagnosis: None,
                notes: None,
                prescription_date: None,
                items: vec![line("Amoxicillin", 10), line("Cefixime", 5), line("Obat Ajaib", 1)],
            })
            .await
            .unwrap();

        let outcome = db.prescriptions().process(prescription.id).await.unwrap();
        assert_eq!(outcome.prescription.status, PrescriptionStatus::Processed);
        assert!(outcome.prescription.processed_at.is_some());
        // Only the matched-but-unavailable line is waitlisted; the unmatched
        // name has nothing to register interest in
        assert_eq!(outcome.waitlisted, 1);

        let pending = db.waitlist().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].entry.quantity_needed, 5);

        // Processing twice is refused
        assert!(db.prescriptions().process(prescription.id).await.is_err());
    }

    #[tokio::test]
    async fn test_search_by_number_and_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = seed(&db).await;

        let (prescription, _) = db
            .prescriptions()
            .create(NewPrescription {
                customer_id: fx.customer_id,
                doctor_id: fx.doctor_id,
                diagnosis: None,
                notes: None,
                prescription_date: None,
                items: vec![line("Amoxicillin", 2)],
            })
            .await
            .unwrap();

        let by_number = db
            .prescriptions()
            .search(&prescription.prescription_number)
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);

        let by_customer = db.prescriptions().search("Sari").await.unwrap();
        assert_eq!(by_customer.len(), 1);
    }
}
