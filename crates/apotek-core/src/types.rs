//! # Domain Types
//!
//! Core domain types used throughout Apotek POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │──►│ MedicineBatch   │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode_id     │   │  batch_number   │   │  invoice_number │       │
//! │  │  capacity       │   │  expiry_date    │   │  total_cents    │       │
//! │  │  minimum_stock  │   │  quantity       │   │  payment_method │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                        │                │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │    Customer     │   │  WaitlistEntry  │   │    SaleItem     │       │
//! │  │  nik (unique)   │   │  (cust, med)    │   │  batch_id       │       │
//! │  │  whatsapp       │   │  is_notified    │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Entities use integer primary keys; medicines additionally carry a
//! human-scannable `barcode_id` business identifier (`APT######YY`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A medicine category (antibiotik, analgesik, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the catalog.
///
/// Stock is never stored on the medicine itself; it is derived from the
/// medicine's batches (see [`MedicineBatch`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    pub id: i64,

    /// Business identifier, auto-generated when not supplied (`APT######YY`).
    pub barcode_id: String,

    pub name: String,
    pub generic_name: Option<String>,
    pub category_id: i64,
    pub manufacturer: Option<String>,

    /// Dispensing unit: tablet, kapsul, ml, ...
    pub unit: String,

    /// Capacity as entered, e.g. "500mg" or "100ml".
    pub capacity: Option<String>,

    /// Parsed magnitude of `capacity`; unset when the string is malformed.
    pub capacity_numeric: Option<f64>,

    /// Parsed unit token of `capacity` (mg, ml, gram, ...).
    pub capacity_unit: Option<String>,

    /// Threshold below which the medicine counts as low stock.
    pub minimum_stock: i64,

    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,

    pub description: Option<String>,
    pub storage_location: Option<String>,
    pub image_url: Option<String>,

    /// Soft-delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }
}

/// A medicine together with its computed stock on hand.
///
/// `total_quantity` sums the quantities of batches that are not expired and
/// not empty; expired or drained batches stay in the database for audit
/// history but never count towards availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MedicineStock {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub medicine: Medicine,

    /// Sum of quantities over non-expired, positive-quantity batches.
    pub total_quantity: i64,
}

impl MedicineStock {
    /// Checks whether the stock on hand is at or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.total_quantity <= self.medicine.minimum_stock
    }

    /// Checks whether there is no sellable stock at all.
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.total_quantity == 0
    }
}

// =============================================================================
// Medicine Batch
// =============================================================================

/// A received lot of a medicine with its own expiry date and quantity.
///
/// Batch quantity is mutable: sales decrement it, and it never goes
/// negative. Empty or expired batches are retained for audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MedicineBatch {
    pub id: i64,
    pub medicine_id: i64,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    pub supplier: Option<String>,
    pub received_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl MedicineBatch {
    /// Whether the batch has passed its expiry date.
    #[inline]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Days until expiry (negative once expired).
    #[inline]
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    /// Whether the batch can satisfy sales: strictly future expiry and
    /// something left in it.
    #[inline]
    pub fn is_available(&self, today: NaiveDate) -> bool {
        self.expiry_date > today && self.quantity > 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    DigitalWallet,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One purchase transaction.
///
/// Customer and doctor details are denormalized onto the sale at the moment
/// of the transaction (snapshot pattern), so later edits to the customer
/// record never rewrite sale history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_nik: String,
    pub customer_phone: Option<String>,
    pub customer_whatsapp: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_phone: Option<String>,
    pub doctor_whatsapp: Option<String>,
    pub prescription_number: Option<String>,
    pub is_prescription: bool,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub cash_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub notes: Option<String>,
    pub cashier: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale, bound to the specific batch it was drawn from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub medicine_id: i64,
    /// The batch the allocator chose; its quantity covered this line in full
    /// at the moment of allocation.
    pub batch_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

// =============================================================================
// Customer / Doctor
// =============================================================================

/// A customer, keyed by national identity number (NIK).
///
/// Contact fields are upserted at sale time: a sale for a known NIK
/// refreshes name/phone/whatsapp instead of inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A prescribing doctor, keyed by STR license number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub str_number: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub hospital_clinic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customer Waitlist
// =============================================================================

/// A customer waiting for an out-of-stock medicine.
///
/// ## Lifecycle
/// ```text
/// pending (is_notified = false)
///    │  restock notification sent successfully
///    ▼
/// notified (is_notified = true, notified_at set)
///    │  customer re-registers interest
///    ▼
/// pending again (flag cleared, quantity_needed raised to max of old/new)
/// ```
///
/// Rows are marked notified, never deleted; the (customer, medicine) pair is
/// unique so re-registration updates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WaitlistEntry {
    pub id: i64,
    pub customer_id: i64,
    pub medicine_id: i64,
    pub quantity_needed: i64,
    pub notes: Option<String>,
    pub is_notified: bool,
    pub created_at: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Notification
// =============================================================================

/// Categories of audit-log notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Expiry,
    LowStock,
    Restock,
    CustomerNotification,
}

/// An append-only audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: String,
    pub customer_id: Option<i64>,
    pub medicine_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Prescription
// =============================================================================

/// Processing state of a prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Pending,
    Processed,
}

/// A doctor's prescription (resep) as taken in at the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: i64,
    pub prescription_number: String,
    pub customer_id: i64,
    pub doctor_id: i64,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    pub prescription_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// One line of a prescription.
///
/// `medicine_id` stays unset when the prescribed name cannot be matched to
/// the catalog; `substitution_medicine_id` records a dispensed alternative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PrescriptionItem {
    pub id: i64,
    pub prescription_id: i64,
    pub medicine_id: Option<i64>,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub is_available: bool,
    pub substitution_medicine_id: Option<i64>,
    pub substitution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
