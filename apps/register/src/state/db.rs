//! # Database State
//!
//! Wraps the `Database` handle for use in register commands.
//!
//! The `Database` from `bodega-db` holds a `SqlitePool`, which is already
//! thread-safe; commands share it without extra locking.
//!
//! ```rust,ignore
//! async fn search_items(db: &DbState, term: &str) -> Result<Vec<StockItem>, ApiError> {
//!     Ok(db.inner().stock().search(term, SearchField::All, 20).await?)
//! }
//! ```

use bodega_db::Database;

/// Wrapper around `Database` for the register's state set.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
