//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──► DbError ──► ApiError { code, msg }  │
//! │   (bodega-core)      (bodega-core) (bodega-db)  (this crate)           │
//! │                                                                         │
//! │  add_payment("Efectivo", 50.00)                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commit_sale ── DbError::NotFound("Stock item") ──┐                    │
//! │         │                                          ▼                    │
//! │         │                               ApiError { NOT_FOUND, ... }    │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────────►   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Errors serialize as `{ "code": "INSUFFICIENT_STOCK", "message": "..." }`
//! so any presentation layer can branch on `code` and show `message`.

use bodega_core::CoreError;
use bodega_db::DbError;
use serde::Serialize;

use crate::state::ConfigError;

/// API error returned from register commands.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Harina P.A.N.: available 5, requested 6"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown item, transaction, line, saved cart, or operator
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart would hold more than is in stock
    InsufficientStock,

    /// Unknown currency or non-positive rate
    InvalidRate,

    /// Image attachment over the configured ceiling
    PayloadTooLarge,

    /// Storage read or write failed; nothing was changed
    PersistenceFailure,

    /// Row changed since it was read
    Conflict,

    /// Operation needs a cart with lines
    EmptyCart,

    /// Acting operator may not perform this operation
    Forbidden,

    /// Anything else
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Rejected(core) => ApiError::from(core),
            conflict @ DbError::Conflict { .. } => {
                tracing::warn!("{}", conflict);
                ApiError::new(ErrorCode::Conflict, conflict.to_string())
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::PersistenceFailure, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::PersistenceFailure, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::PersistenceFailure, "Database operation failed")
            }
            DbError::Corrupt { field, reason } => {
                tracing::error!(field = %field, "Corrupt stored value: {}", reason);
                ApiError::new(
                    ErrorCode::PersistenceFailure,
                    format!("Stored {} value could not be read", field),
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::PersistenceFailure, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::PersistenceFailure, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::InvalidRate { .. } => ApiError::new(ErrorCode::InvalidRate, message),
            CoreError::PayloadTooLarge { .. } => {
                ApiError::new(ErrorCode::PayloadTooLarge, message)
            }
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, message),
        }
    }
}

impl From<bodega_core::ValidationError> for ApiError {
    fn from(err: bodega_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::Internal, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
