//! # Error Types
//!
//! Domain-specific error types for siconi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  siconi-core (this file)                                               │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  siconi-db                                                             │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  apps/backoffice                                                       │
//! │  └── CliError         - Code + message printed to the operator         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CliError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id or code does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale id or code does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Client id does not exist.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Not enough units on hand for a sale line or an outgoing adjustment.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: BAÑ-001 × 5
    ///      │
    ///      ▼
    /// UPDATE ... WHERE current_stock >= 5  → 0 rows
    ///      │
    ///      ▼
    /// InsufficientStock { code: "BAÑ-001", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Sale is in a status that does not allow the operation.
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// A sale must carry at least one line.
    #[error("Sale has no lines")]
    EmptySale,

    /// Too many lines on one order.
    #[error("Sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Invoice and control numbers were already assigned to this sale.
    #[error("Sale {sale_code} already has invoice {invoice_number}")]
    InvoiceAlreadyIssued {
        sale_code: String,
        invoice_number: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs or any row is written.
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

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "BAN-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for BAN-001: available 3, requested 5"
        );

        let err = CoreError::InvoiceAlreadyIssued {
            sale_code: "PED-0004".to_string(),
            invoice_number: "00000002".to_string(),
        };
        assert_eq!(err.to_string(), "Sale PED-0004 already has invoice 00000002");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: reason is required");
    }
}
