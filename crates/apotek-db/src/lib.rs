//! # apotek-db: Database Layer for Apotek POS
//!
//! This crate provides database access for the Apotek POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Apotek POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (search_medicines, create_sale, ...)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     apotek-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (medicine.rs, │    │  (embedded)  │  │   │
//! │  │   │               │    │  batch.rs,    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  sale.rs, ...)│    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                        SQLite Database                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (medicine, batch, sale, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use apotek_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/apotek.db")).await?;
//!
//! let results = db.medicines().search("amoxi", SearchKind::All).await?;
//! let alternatives = db.medicines().alternatives_for(42).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::{BatchRepository, NewBatch};
pub use repository::category::CategoryRepository;
pub use repository::customer::{CustomerInfo, CustomerRepository};
pub use repository::doctor::{DoctorInfo, DoctorRepository};
pub use repository::medicine::{
    MedicineHit, MedicineRepository, NewMedicine, SearchKind, UpdateMedicine,
};
pub use repository::notification::{NewNotification, NotificationRepository};
pub use repository::prescription::{
    NewPrescription, NewPrescriptionItem, PrescriptionRepository, ProcessOutcome,
};
pub use repository::sale::{CreateSaleRequest, SaleLine, SaleRepository, TopMedicine};
pub use repository::waitlist::{PendingWaiter, WaitlistRepository, WaitlistSummary};
