//! # Register Commands
//!
//! One async function per ledger operation. A presentation layer (GUI,
//! terminal, HTTP shim) calls these and nothing else.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── inventory.rs    ◄─── Stock item CRUD, search, history
//! ├── cart.rs         ◄─── Cart lines, discounts, notes
//! ├── checkout.rs     ◄─── Payments, commit, cancel
//! ├── history.rs      ◄─── Transactions, returns, images
//! ├── saved_carts.rs  ◄─── Save / load / delete snapshots
//! ├── rates.rs        ◄─── Exchange rates, display currency
//! ├── reports.rs      ◄─── Sales aggregation
//! ├── session.rs      ◄─── Operator roster and selection
//! └── config.rs       ◄─── Configuration retrieval
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn search_items(db: &DbState, ...)
//!
//! // Only needs cart
//! async fn cancel_checkout(cart: &CartState, config: &ConfigState)
//!
//! // Needs everything: commits a sale as the acting operator
//! async fn add_payment(db: &DbState, cart: &CartState, config: &ConfigState,
//!                      session: &SessionState, ...)
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod history;
pub mod inventory;
pub mod rates;
pub mod reports;
pub mod saved_carts;
pub mod session;
