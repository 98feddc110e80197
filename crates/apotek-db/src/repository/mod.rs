//! # Repository Implementations
//!
//! One repository per aggregate, each a thin struct over the shared
//! [`SqlitePool`](sqlx::SqlitePool). Repositories own the SQL; callers see
//! domain types from `apotek-core` and small DTOs defined next to the
//! repository that consumes them.
//!
//! ## Conventions
//! - Reads return domain structs via `query_as` + `FromRow`
//! - Writes re-read the inserted row (`last_insert_rowid()`) so callers get
//!   database-assigned defaults back
//! - Multi-step writes that must be atomic (the sale flow) run on a
//!   transaction; the helpers they need take `&mut SqliteConnection` so they
//!   work inside or outside one

pub mod batch;
pub mod category;
pub mod customer;
pub mod doctor;
pub mod medicine;
pub mod notification;
pub mod prescription;
pub mod sale;
pub mod waitlist;
