//! # Error Types
//!
//! Domain-specific error types for mercado-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  mercado-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations (cart, stock)      │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  mercado-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → presentation layer   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (name, quantity, etc.)
//! 3. Errors are enum variants, never String
//! 4. The presentation layer owns user-facing wording; these messages are
//!    for logs and diagnostics

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to complete the requested cart change.
    ///
    /// ## When This Occurs
    /// - Requested quantity plus what is already in the cart exceeds the
    ///   live stock level of a stock-tracked product
    ///
    /// The check reads live stock; the sale engine itself does not re-check
    /// (single active terminal assumed).
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A non-inventoried product was added as a normal inventory line.
    /// Recharges carry a caller-chosen face amount instead of a list price.
    #[error("'{name}' is sold by face amount, use a recharge line")]
    NotAnInventoryItem { name: String },

    /// A recharge line was requested for a stock-tracked product.
    #[error("'{name}' is a stock-tracked product, not a recharge")]
    NotRechargeable { name: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Referenced cart line does not exist.
    #[error("no cart line at position {index}")]
    LineNotFound { index: usize },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Lápiz HB #2".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for 'Lápiz HB #2': available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
