//! # Error Types
//!
//! Domain-specific error types for apotek-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apotek-core errors (this file)                                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  apotek-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures + business rule violations   │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ApiError → Client                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medicine name, field, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed NIK, malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date must lie in the future (e.g., batch expiry on intake).
    #[error("{field} must be a future date")]
    MustBeFuture { field: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InvalidFormat {
            field: "nik".to_string(),
            reason: "must be 16 digits".to_string(),
        };
        assert_eq!(err.to_string(), "nik has invalid format: must be 16 digits");
    }
}
