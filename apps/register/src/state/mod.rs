//! # State Module
//!
//! One focused state type per concern. Commands take only the handles they
//! need, which keeps their signatures honest and lets tests build exactly
//! the state a command touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌───────────────┐  │
//! │  │   DbState    │ │  CartState   │ │ ConfigState  │ │ SessionState  │  │
//! │  │              │ │              │ │              │ │               │  │
//! │  │  Database    │ │  Arc<Mutex<  │ │  tax rate    │ │  roster       │  │
//! │  │  (SQLite     │ │    Cart      │ │  image cap   │ │  current      │  │
//! │  │   pool)      │ │  >>          │ │  delete mode │ │  operator     │  │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └───────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: pool is internally synchronized                            │
//! │  • CartState: tokio Mutex, held across the checkout commit             │
//! │  • ConfigState: read-only after load                                   │
//! │  • SessionState: tokio RwLock                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod session;

pub use cart::CartState;
pub use config::{ConfigError, ConfigState};
pub use db::DbState;
pub use session::SessionState;
