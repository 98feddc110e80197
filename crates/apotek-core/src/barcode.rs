//! # Barcode Id Generation
//!
//! Medicines carry a scannable business identifier in the format
//! `APT` + 6 random digits + 2-digit year, e.g. `APT48210925`.
//!
//! This module only produces *candidates*; uniqueness is a database
//! constraint, and the repository retries with a fresh candidate on
//! collision.

use rand::Rng;

/// Prefix for all generated barcode ids.
pub const BARCODE_PREFIX: &str = "APT";

/// Produces one barcode id candidate: `APT` + 6 random digits + `year_suffix`.
///
/// `year_suffix` is the two-digit year (e.g. `"25"` for 2025); the caller
/// derives it from the current date so this function stays clock-free.
pub fn barcode_id_candidate<R: Rng>(rng: &mut R, year_suffix: &str) -> String {
    let random_part: u32 = rng.gen_range(0..1_000_000);
    format!("{BARCODE_PREFIX}{random_part:06}{year_suffix}")
}
