//! # Error Types
//!
//! Domain-specific error types for bodega-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bodega-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bodega-db errors (separate crate)                                     │
//! │  └── DbError          - Persistence failures, wraps CoreError          │
//! │                                                                         │
//! │  Register API errors (in app)                                          │
//! │  └── ApiError         - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the context needed to render a specific message:
//! the item name, requested vs. available quantity, or offending currency.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A cart operation would exceed the stock on hand.
    ///
    /// ## When This Occurs
    /// ```text
    /// Stock: 5 units of "Harina P.A.N."
    ///      │
    ///      ▼
    /// Cart already holds 3, operator adds 3 more
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Harina P.A.N.", available: 5, requested: 6 }
    /// ```
    /// Also raised for a requested quantity of zero or less on `add_line`.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Conversion against an unknown currency or a non-positive rate.
    #[error("Invalid rate for {currency}: {reason}")]
    InvalidRate { currency: String, reason: String },

    /// Image attachment exceeds the configured ceiling.
    #[error("Payload too large: {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// Operation references an unknown item, line, transaction, or cart.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Payments or archive operations need a cart with at least one line.
    #[error("Cart is empty")]
    EmptyCart,
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidRate error.
    pub fn invalid_rate(currency: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidRate {
            currency: currency.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation runs, so a rejected create/update never
/// leaves a partial change behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// Invalid format (e.g., fractional count for a discrete item).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Requested quantity is more than what is left to act on.
    #[error("{field} of {requested} exceeds the {remaining} remaining")]
    ExceedsRemaining {
        field: String,
        requested: Decimal,
        remaining: Decimal,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
