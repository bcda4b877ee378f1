//! # Repository Module
//!
//! Database repository implementations for the Bodega ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  db.stock().adjust_quantity(id, -3, user, Sale)                 │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                   │
//! │  ├── BEGIN                                                             │
//! │  ├── UPDATE items SET quantity, version + 1                            │
//! │  ├── INSERT INTO history (previous, new)                               │
//! │  └── COMMIT  ← value change and audit record land together             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Stock items, audit history, search
//! - [`ledger::LedgerRepository`] - Sale commit, returns, images
//! - [`saved_cart::SavedCartRepository`] - Cart snapshots
//! - [`settings::SettingsRepository`] - Key/value settings and exchange rates

pub mod inventory;
pub mod ledger;
pub mod saved_cart;
pub mod settings;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Decimal columns are TEXT; trailing zeros are dropped so "2.50" and
/// "2.5" store identically.
pub(crate) fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::corrupt(field, e))
}

/// Escapes `%`, `_` and `\` so user text is matched literally by LIKE.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
