//! # bodega-db: Database Layer for Bodega
//!
//! Every durable write of the register goes through this crate. It uses
//! SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Data Flow                                 │
//! │                                                                         │
//! │  Register command (checkout / return_item / update_item)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bodega-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ Inventory      │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Ledger         │   │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ SavedCart      │   │              │  │   │
//! │  │   │               │    │ Settings       │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/bodega/bodega.db (platform data dir)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Inventory, ledger, saved carts, settings
//! - [`seed`] - Starter items and rates for a fresh register
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bodega_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bodega.db")).await?;
//!
//! let hits = db.stock().search("harina", SearchField::All, 20).await?;
//! let sale = db.ledger().commit_sale(&cart, "vendedor-1", TaxRate::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use seed::{seed_defaults, SeedReport};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::saved_cart::SavedCartRepository;
pub use repository::settings::SettingsRepository;
