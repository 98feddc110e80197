//! # Validation Module
//!
//! Input validation utilities for Apotek POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP request (serde)                                         │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field and business rule validation                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (barcode_id, nik, invoice_number, ...)         │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: each layer catches a different failure class        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name field (customer, doctor, medicine).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an Indonesian national identity number (NIK).
///
/// ## Rules
/// - Exactly 16 characters
/// - Digits only
///
/// ## Example
/// ```rust
/// use apotek_core::validation::validate_nik;
///
/// assert!(validate_nik("3201011503900001").is_ok());
/// assert!(validate_nik("12345").is_err());
/// assert!(validate_nik("32010115039000AB").is_err());
/// ```
pub fn validate_nik(nik: &str) -> ValidationResult<()> {
    let nik = nik.trim();

    if nik.is_empty() {
        return Err(ValidationError::Required {
            field: "nik".to_string(),
        });
    }

    if nik.len() != 16 || !nik.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "nik".to_string(),
            reason: "must be exactly 16 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or batch quantity.
///
/// ## Rules
/// - Must be positive
/// - Must be at most [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (purchase or selling).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates an expiry date on batch intake: it must be strictly in the
/// future, since a batch expiring today can never be allocated.
pub fn validate_expiry(expiry_date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if expiry_date <= today {
        return Err(ValidationError::MustBeFuture {
            field: "expiry_date".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("customer_name", "Ibu Sari").is_ok());
        assert!(validate_name("customer_name", "   ").is_err());
        assert!(validate_name("customer_name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_nik() {
        assert!(validate_nik("3201011503900001").is_ok());
        assert!(validate_nik("").is_err());
        assert!(validate_nik("320101150390000").is_err()); // 15 digits
        assert!(validate_nik("32010115039000012").is_err()); // 17 digits
        assert!(validate_nik("32010115039000a1").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_expiry() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(validate_expiry(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), today).is_ok());
        assert!(validate_expiry(today, today).is_err());
        assert!(validate_expiry(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(), today).is_err());
    }
}
