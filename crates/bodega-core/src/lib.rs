//! # bodega-core: Pure Ledger Logic for Bodega
//!
//! This crate holds the rules that keep quantity, price, currency,
//! discount, tax, and payment consistent. It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (external consumer)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ async calls                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              bodega-register (commands + state)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bodega-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ pricing │ │   cart   │ │checkout│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │   ┌────────────┐ ┌─────────┐                                    │   │
//! │  │   │ validation │ │ report  │        NO I/O • NO DATABASE        │   │
//! │  │   └────────────┘ └─────────┘                                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bodega-db (SQLite persistence)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stock items, audit records, cart lines, transactions, rates
//! - [`money`] - Integer minor-unit money
//! - [`pricing`] - Conversion, discount, tax, totals
//! - [`cart`] - The open sale and its reservations
//! - [`checkout`] - Payment state machine
//! - [`validation`] - Input rules checked before any mutation
//! - [`report`] - Sales aggregation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bodega_core::money::Money;
//! use bodega_core::types::TaxRate;
//!
//! let line = Money::from_cents(1800);
//! let tax = line.calculate_tax(TaxRate::default());
//! assert_eq!(tax.cents(), 180);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartSummary};
pub use checkout::{CheckoutPhase, PaymentOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::Totals;
pub use report::SalesReport;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate applied to taxable lines: 10%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Default ceiling for an attached receipt image: 1 MiB.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Currency every stored price and total is expressed in.
pub const BASE_CURRENCY: &str = "BS";
