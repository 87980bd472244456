//! # CLI Error Type
//!
//! Every failure a command can hit, flattened to a machine-readable code and
//! a message. Printed as JSON on stderr; the code also picks the exit status.
//!
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for LEN-001: ..." }
//! ```

use serde::Serialize;
use siconi_core::{CoreError, ValidationError};
use siconi_db::DbError;

use crate::config::ConfigError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DatabaseError,
    /// A business rule refused the operation (status, invoice already issued)
    BusinessLogic,
    InsufficientStock,
    PaymentError,
    ConfigError,
    Internal,
}

impl ErrorCode {
    /// Process exit status for this kind of failure.
    pub const fn exit_code(self) -> i32 {
        match self {
            ErrorCode::NotFound => 3,
            ErrorCode::ValidationError => 2,
            ErrorCode::BusinessLogic | ErrorCode::InsufficientStock | ErrorCode::PaymentError => 4,
            ErrorCode::ConfigError => 78,
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => CliError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                CliError::validation("Invalid reference (unknown category, supplier, club or client)")
            }
            DbError::ConnectionFailed(e) => {
                CliError::new(ErrorCode::DatabaseError, format!("Database connection failed: {}", e))
            }
            DbError::MigrationFailed(e) => {
                CliError::new(ErrorCode::DatabaseError, format!("Database migration failed: {}", e))
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => CliError::not_found("Sale", &id),
            CoreError::ClientNotFound(id) => CliError::not_found("Client", &id),
            CoreError::InsufficientStock { .. } => CliError::new(ErrorCode::InsufficientStock, message),
            CoreError::InvalidSaleStatus { .. } | CoreError::InvoiceAlreadyIssued { .. } => {
                CliError::new(ErrorCode::BusinessLogic, message)
            }
            CoreError::InvalidPaymentAmount { .. } => CliError::new(ErrorCode::PaymentError, message),
            CoreError::EmptySale
            | CoreError::TooManyLines { .. }
            | CoreError::QuantityTooLarge { .. } => CliError::validation(message),
            CoreError::Validation(e) => CliError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("JSON error: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
