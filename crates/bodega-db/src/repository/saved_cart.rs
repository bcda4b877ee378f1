//! # Saved Cart Repository
//!
//! Named snapshots of an open cart. Lines and payments are stored as JSON
//! because a snapshot is always read back whole.

use bodega_core::{CartLine, CoreError, PendingPayment, SavedCart};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, name, saved_at, lines, payments, notes";

const DEFAULT_NAME_PREFIX: &str = "Ticket ";

#[derive(Debug, sqlx::FromRow)]
struct SavedCartRow {
    id: String,
    name: String,
    saved_at: DateTime<Utc>,
    lines: String,
    payments: String,
    notes: String,
}

impl SavedCartRow {
    fn into_saved_cart(self) -> DbResult<SavedCart> {
        let lines: Vec<CartLine> = serde_json::from_str(&self.lines)?;
        let payments: Vec<PendingPayment> = serde_json::from_str(&self.payments)?;
        Ok(SavedCart {
            id: self.id,
            name: self.name,
            saved_at: self.saved_at,
            lines,
            payments,
            notes: self.notes,
        })
    }
}

/// Repository for saved cart snapshots.
#[derive(Debug, Clone)]
pub struct SavedCartRepository {
    pool: SqlitePool,
}

impl SavedCartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SavedCartRepository { pool }
    }

    /// Persists a snapshot produced by `Cart::snapshot`.
    pub async fn save(&self, saved: &SavedCart) -> DbResult<()> {
        if saved.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        sqlx::query(
            r#"
            INSERT INTO saved_carts (id, name, saved_at, lines, payments, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&saved.id)
        .bind(&saved.name)
        .bind(saved.saved_at)
        .bind(serde_json::to_string(&saved.lines)?)
        .bind(serde_json::to_string(&saved.payments)?)
        .bind(&saved.notes)
        .execute(&self.pool)
        .await?;

        info!(id = %saved.id, name = %saved.name, lines = saved.lines.len(), "Cart saved");
        Ok(())
    }

    /// `Ticket N`, one past the highest `Ticket N` still on file.
    ///
    /// Names that don't end in a number (`Ticket mesa 2`, `Mesa 4`) are
    /// ignored.
    pub async fn next_default_name(&self) -> DbResult<String> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM saved_carts WHERE name LIKE ?1")
                .bind(format!("{DEFAULT_NAME_PREFIX}%"))
                .fetch_all(&self.pool)
                .await?;

        let highest = names
            .iter()
            .filter_map(|name| name.strip_prefix(DEFAULT_NAME_PREFIX))
            .filter_map(|suffix| suffix.trim().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("{DEFAULT_NAME_PREFIX}{}", highest.saturating_add(1)))
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<SavedCart>> {
        let sql = format!("SELECT {COLUMNS} FROM saved_carts ORDER BY saved_at DESC, rowid DESC");
        sqlx::query_as::<_, SavedCartRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SavedCartRow::into_saved_cart)
            .collect()
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SavedCart>> {
        let sql = format!("SELECT {COLUMNS} FROM saved_carts WHERE id = ?1");
        sqlx::query_as::<_, SavedCartRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SavedCartRow::into_saved_cart)
            .transpose()
    }

    pub async fn get_required(&self, id: &str) -> DbResult<SavedCart> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Saved cart", id))
    }

    /// Removes a snapshot. Returns whether one existed; deleting twice is fine.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM saved_carts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        debug!(id = %id, removed, "Saved cart delete");
        Ok(removed)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_carts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
