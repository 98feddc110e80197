//! # Sale Repository
//!
//! The POS checkout flow, as one database transaction.
//!
//! ## Transaction Shape
//! ```text
//! BEGIN
//!   1. upsert customer by NIK (snapshot source)
//!   2. resolve doctor (existing, or register with STR, or fail)
//!   3. for each line:
//!        a. load active medicine (price + name)
//!        b. pick earliest-expiring batch covering the full line
//!        c. conditionally decrement it (0 rows affected → fail)
//!        d. stage the sale item
//!   4. insert sale header (invoice number, totals, change)
//!   5. insert sale items
//! COMMIT            -- any failure above rolls everything back
//! ```
//!
//! A failure on line 3 of a 3-line sale must not leave lines 1-2 decremented,
//! which is why allocation happens inside the transaction rather than as a
//! pre-check.

use apotek_core::money::Money;
use apotek_core::types::{PaymentMethod, Sale, SaleItem};
use apotek_core::validation::validate_quantity;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::batch::BatchRepository;
use crate::repository::customer::{CustomerInfo, CustomerRepository};
use crate::repository::doctor::{DoctorInfo, DoctorRepository};

// =============================================================================
// DTOs
// =============================================================================

/// One line of a checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLine {
    pub medicine_id: i64,
    pub quantity: i64,
}

/// A checkout request from the POS.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub customer: CustomerInfo,
    /// Present on prescription sales.
    pub doctor: Option<DoctorInfo>,
    pub prescription_number: Option<String>,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Cash tendered; change is computed server-side.
    pub cash_cents: Option<i64>,
    pub notes: Option<String>,
    pub cashier: String,
}

/// Aggregated sales row for the best-seller report.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct TopMedicine {
    pub medicine_id: i64,
    pub name: String,
    pub total_sold: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Executes a checkout atomically. On success the sale, its items, the
    /// customer upsert, and every stock decrement are committed together;
    /// on any failure none of them are.
    pub async fn create_sale(&self, request: CreateSaleRequest) -> DbResult<Sale> {
        if request.items.is_empty() {
            return Err(DbError::QueryFailed("sale has no items".to_string()));
        }

        let now = Utc::now();
        let today = now.date_naive();
        let mut tx = self.pool.begin().await?;

        let customer = CustomerRepository::upsert_by_nik_on(&mut tx, &request.customer).await?;

        let doctor = match &request.doctor {
            Some(info) => Some(DoctorRepository::resolve_on(&mut tx, info).await?),
            None => None,
        };

        // Allocate every line before writing the header so the total is known
        let mut total = Money::zero();
        let mut staged: Vec<(i64, i64, i64, Money, Money)> = Vec::with_capacity(request.items.len());

        for line in &request.items {
            validate_quantity(line.quantity)?;

            let row: Option<(String, i64)> = sqlx::query_as(
                "SELECT name, selling_price_cents FROM medicines WHERE id = ? AND is_active = 1",
            )
            .bind(line.medicine_id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some((name, selling_price_cents)) = row else {
                return Err(DbError::not_found("Medicine", line.medicine_id));
            };

            let batch =
                BatchRepository::find_allocatable(&mut tx, line.medicine_id, line.quantity, today)
                    .await?
                    .ok_or_else(|| DbError::insufficient_stock(&name))?;

            // A concurrent sale may have drained the batch since the read
            if !BatchRepository::decrement(&mut tx, batch.id, line.quantity).await? {
                warn!(
                    medicine = %name,
                    batch_id = batch.id,
                    "Batch drained during checkout"
                );
                return Err(DbError::insufficient_stock(&name));
            }

            let unit_price = Money::from_cents(selling_price_cents);
            let line_total = unit_price
                .checked_mul(line.quantity)
                .ok_or_else(|| DbError::Internal("sale line total overflow".to_string()))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| DbError::Internal("sale total overflow".to_string()))?;

            staged.push((line.medicine_id, batch.id, line.quantity, unit_price, line_total));
        }

        let change_cents = match (request.payment_method, request.cash_cents) {
            (PaymentMethod::Cash, Some(cash)) => {
                if cash < total.cents() {
                    return Err(DbError::InsufficientCash {
                        required_cents: total.cents(),
                        tendered_cents: cash,
                    });
                }
                Some(cash - total.cents())
            }
            _ => None,
        };

        let is_prescription = doctor.is_some() || request.prescription_number.is_some();
        let invoice = invoice_number(now);

        let sale = sqlx::query_as::<_, Sale>(
            "INSERT INTO sales \
             (invoice_number, customer_name, customer_nik, customer_phone, customer_whatsapp, \
              doctor_name, doctor_phone, doctor_whatsapp, prescription_number, is_prescription, \
              total_cents, payment_method, cash_cents, change_cents, notes, cashier, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(&invoice)
        .bind(&customer.name)
        .bind(&customer.nik)
        .bind(&customer.phone)
        .bind(&customer.whatsapp)
        .bind(doctor.as_ref().map(|d| d.name.as_str()))
        .bind(doctor.as_ref().and_then(|d| d.phone.as_deref()))
        .bind(doctor.as_ref().and_then(|d| d.whatsapp.as_deref()))
        .bind(&request.prescription_number)
        .bind(is_prescription)
        .bind(total.cents())
        .bind(request.payment_method)
        .bind(request.cash_cents)
        .bind(change_cents)
        .bind(&request.notes)
        .bind(request.cashier.trim())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (medicine_id, batch_id, quantity, unit_price, line_total) in &staged {
            sqlx::query(
                "INSERT INTO sale_items \
                 (sale_id, medicine_id, batch_id, quantity, unit_price_cents, total_price_cents) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(sale.id)
            .bind(medicine_id)
            .bind(batch_id)
            .bind(quantity)
            .bind(unit_price.cents())
            .bind(line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            invoice = %sale.invoice_number,
            total = %total,
            items = staged.len(),
            "Sale completed"
        );
        Ok(sale)
    }

    /// Fetches a sale by id.
    pub async fn get(&self, id: i64) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Fetches a sale by invoice number.
    pub async fn get_by_invoice(&self, invoice: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE invoice_number = ?")
            .bind(invoice.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", invoice))
    }

    /// Line items of a sale.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ? ORDER BY id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Best-selling medicines by units sold.
    pub async fn top_selling(&self, limit: i64) -> DbResult<Vec<TopMedicine>> {
        let rows = sqlx::query_as::<_, TopMedicine>(
            "SELECT si.medicine_id AS medicine_id, m.name AS name, \
                    SUM(si.quantity) AS total_sold \
             FROM sale_items si \
             JOIN medicines m ON m.id = si.medicine_id \
             GROUP BY si.medicine_id, m.name \
             ORDER BY total_sold DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// `INV-YYYYMMDD-XXXXXXXX`, suffix from a v4 UUID. Uniqueness is backed by
/// the invoice_number constraint.
fn invoice_number(now: DateTime<Utc>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("INV-{}-{}", now.format("%Y%m%d"), id[..8].to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
