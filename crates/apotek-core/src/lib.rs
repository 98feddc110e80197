//! # apotek-core: Pure Business Logic for Apotek POS
//!
//! This crate is the **heart** of Apotek POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Apotek POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP Clients (POS UI)                        │   │
//! │  │    medicine search ──► sale creation ──► waitlist/restock      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ apotek-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  capacity │  │   phone   │  │ validation│  │   │
//! │  │   │  Medicine │  │  "500mg"  │  │  0 -> 62  │  │   rules   │  │   │
//! │  │   │   Sale    │  │  parsing  │  │  prefix   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apotek-db (Database Layer)                   │   │
//! │  │         SQLite queries, migrations, batch allocator             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Medicine, Batch, Sale, Waitlist, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`capacity`] - Capacity string parsing and tolerance matching
//! - [`phone`] - WhatsApp number normalization and message templates
//! - [`barcode`] - Barcode id candidate generation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod capacity;
pub mod error;
pub mod money;
pub mod phone;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use capacity::Capacity;
pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Relative tolerance for "similar capacity" alternative matching.
///
/// A 500mg tablet matches alternatives between 400mg and 600mg
/// (same capacity unit required).
pub const CAPACITY_TOLERANCE: f64 = 0.20;

/// Default minimum-stock threshold for new medicines.
pub const DEFAULT_MINIMUM_STOCK: i64 = 10;

/// How far ahead the expiry report looks, in days.
pub const EXPIRY_WARNING_DAYS: i64 = 14;

/// Maximum quantity of a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
