//! # Inventory Repository
//!
//! Stock items, the authoritative quantity on hand, and the append-only
//! audit history behind every change.
//!
//! ## Write Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create          INSERT items          + history 'create'  (0 → qty)    │
//! │  update          UPDATE items          + history 'update'  (if qty      │
//! │                                          changed, or notes given)       │
//! │  adjust_quantity UPDATE items.quantity + history 'sale' / 'return'      │
//! │  delete (purge)  DELETE items          (history cascades)               │
//! │  delete (tomb.)  UPDATE deleted_at     + history 'delete'               │
//! │                                                                         │
//! │  Each row above is ONE SQLite transaction. Every UPDATE is guarded by  │
//! │  `version = ?`, so a lost update surfaces as DbError::Conflict.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities never go below zero: an oversell clamps at 0 and is logged.

use std::collections::HashMap;

use bodega_core::{
    validation, AuditAction, AuditRecord, DeletePolicy, Discount, Money, QuantityChange,
    SearchField, StockItem, StockItemInput, StockMovement, Unit,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{decimal_text, like_pattern, parse_decimal};
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str = "id, name, barcode, buying_price, selling_price, quantity, unit, \
     includes_tax, discount_bps, currency, created_at, updated_at, version";

const HISTORY_COLUMNS: &str =
    "id, item_id, action, timestamp, details, user_id, previous_quantity, new_quantity";

const ENTITY: &str = "Stock item";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    barcode: String,
    buying_price: i64,
    selling_price: i64,
    quantity: String,
    unit: Unit,
    includes_tax: bool,
    discount_bps: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl ItemRow {
    fn into_item(self, history: Vec<AuditRecord>) -> DbResult<StockItem> {
        Ok(StockItem {
            quantity: parse_decimal("items.quantity", &self.quantity)?,
            id: self.id,
            name: self.name,
            barcode: self.barcode,
            buying_price: Money::from_cents(self.buying_price),
            selling_price: Money::from_cents(self.selling_price),
            unit: self.unit,
            includes_tax: self.includes_tax,
            discount: Discount::from_bps(self.discount_bps.clamp(0, 10_000) as u32),
            currency: self.currency,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
            history,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    item_id: String,
    action: AuditAction,
    timestamp: DateTime<Utc>,
    details: String,
    user_id: String,
    previous_quantity: Option<String>,
    new_quantity: Option<String>,
}

impl HistoryRow {
    fn into_record(self) -> DbResult<AuditRecord> {
        let quantity_change = match (self.previous_quantity, self.new_quantity) {
            (Some(previous), Some(new)) => Some(QuantityChange {
                previous: parse_decimal("history.previous_quantity", &previous)?,
                new: parse_decimal("history.new_quantity", &new)?,
            }),
            _ => None,
        };
        Ok(AuditRecord {
            id: self.id,
            item_id: self.item_id,
            action: self.action,
            timestamp: self.timestamp,
            details: self.details,
            user_id: self.user_id,
            quantity_change,
        })
    }
}

// =============================================================================
// Connection-level Helpers (shared with the ledger's write units)
// =============================================================================

async fn fetch_live_row(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ItemRow>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND deleted_at IS NULL");
    let row = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn current_version(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM items WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    version.ok_or_else(|| DbError::not_found(ENTITY, id))
}

async fn append_audit(
    conn: &mut SqliteConnection,
    item_id: &str,
    action: AuditAction,
    details: &str,
    user_id: &str,
    change: Option<QuantityChange>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO history (
            id, item_id, action, timestamp, details, user_id,
            previous_quantity, new_quantity
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(action)
    .bind(Utc::now())
    .bind(details)
    .bind(user_id)
    .bind(change.map(|c| decimal_text(c.previous)))
    .bind(change.map(|c| decimal_text(c.new)))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn signed(delta: Decimal) -> String {
    if delta.is_sign_positive() && !delta.is_zero() {
        format!("+{}", delta.normalize())
    } else {
        delta.normalize().to_string()
    }
}

/// Moves stock on an open connection/transaction and appends the audit
/// record. Used by `adjust_quantity`, sale commit, and returns.
///
/// A move that leaves the quantity where it was (a zero delta, or a sale
/// against stock already clamped at 0) writes nothing.
pub(crate) async fn adjust_quantity_in(
    conn: &mut SqliteConnection,
    id: &str,
    delta: Decimal,
    user_id: &str,
    movement: StockMovement,
    reference: Option<&str>,
) -> DbResult<QuantityChange> {
    let row = fetch_live_row(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found(ENTITY, id))?;
    let previous = parse_decimal("items.quantity", &row.quantity)?;

    let mut new = previous + delta;
    if new < Decimal::ZERO {
        warn!(
            id = %id,
            name = %row.name,
            previous = %previous,
            delta = %delta,
            "Oversell clamped at zero"
        );
        new = Decimal::ZERO;
    }

    let change = QuantityChange { previous, new };
    if new == previous {
        debug!(id = %id, quantity = %previous, "Stock unchanged, nothing recorded");
        return Ok(change);
    }

    let result = sqlx::query(
        r#"
        UPDATE items SET
            quantity = ?1,
            updated_at = ?2,
            version = version + 1
        WHERE id = ?3 AND version = ?4
        "#,
    )
    .bind(decimal_text(new))
    .bind(Utc::now())
    .bind(id)
    .bind(row.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let found = current_version(conn, id).await?;
        return Err(DbError::Conflict {
            entity: ENTITY.to_string(),
            id: id.to_string(),
            expected: row.version,
            found,
        });
    }

    let verb = match movement {
        StockMovement::Sale => "Sale",
        StockMovement::Return => "Return",
    };
    let details = match reference {
        Some(tx) => format!("{}: {} (transaction {})", verb, signed(delta), tx),
        None => format!("{}: {}", verb, signed(delta)),
    };

    append_audit(conn, id, movement.action(), &details, user_id, Some(change)).await?;

    debug!(id = %id, previous = %previous, new = %new, "Stock adjusted");
    Ok(change)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock items and their history.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
    base_currency: String,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository whose new items are priced in
    /// `base_currency`.
    pub fn new(pool: SqlitePool, base_currency: impl Into<String>) -> Self {
        InventoryRepository {
            pool,
            base_currency: base_currency.into(),
        }
    }

    /// Creates a stock item and its `create` audit record.
    ///
    /// ## Errors
    /// - `Rejected(Validation)` for a missing name, barcode, or price, a
    ///   negative quantity, or a fractional count of a discrete item
    pub async fn create(&self, input: &StockItemInput, user_id: &str) -> DbResult<StockItem> {
        let valid = validation::validate_stock_input(input)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %valid.name, "Creating stock item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, barcode, buying_price, selling_price, quantity, unit,
                includes_tax, discount_bps, currency, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, 1)
            "#,
        )
        .bind(&id)
        .bind(&valid.name)
        .bind(&valid.barcode)
        .bind(valid.buying_price.cents())
        .bind(valid.selling_price.cents())
        .bind(decimal_text(valid.quantity))
        .bind(valid.unit)
        .bind(valid.includes_tax)
        .bind(valid.discount.bps() as i64)
        .bind(&self.base_currency)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let change = QuantityChange {
            previous: Decimal::ZERO,
            new: valid.quantity,
        };
        append_audit(&mut tx, &id, AuditAction::Create, "Item created", user_id, Some(change))
            .await?;

        tx.commit().await?;

        info!(id = %id, name = %valid.name, quantity = %valid.quantity, "Stock item created");
        self.get_required(&id).await
    }

    /// Replaces every mutable field of a stock item.
    ///
    /// ## Audit Semantics
    /// ```text
    /// quantity changed            → 'update' with previous/new and delta (+ notes)
    /// unchanged, notes given      → 'update' with the notes only
    /// unchanged, no notes         → no record
    /// ```
    pub async fn update(
        &self,
        id: &str,
        input: &StockItemInput,
        user_id: &str,
        notes: Option<&str>,
    ) -> DbResult<StockItem> {
        let valid = validation::validate_stock_input(input)?;

        debug!(id = %id, "Updating stock item");

        let mut tx = self.pool.begin().await?;

        let current = fetch_live_row(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))?;

        if let Some(expected) = input.expected_version {
            if expected != current.version {
                warn!(id = %id, expected, found = current.version, "Rejected stale update");
                return Err(DbError::Conflict {
                    entity: ENTITY.to_string(),
                    id: id.to_string(),
                    expected,
                    found: current.version,
                });
            }
        }

        let previous = parse_decimal("items.quantity", &current.quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?1,
                barcode = ?2,
                buying_price = ?3,
                selling_price = ?4,
                quantity = ?5,
                unit = ?6,
                includes_tax = ?7,
                discount_bps = ?8,
                updated_at = ?9,
                version = version + 1
            WHERE id = ?10 AND version = ?11
            "#,
        )
        .bind(&valid.name)
        .bind(&valid.barcode)
        .bind(valid.buying_price.cents())
        .bind(valid.selling_price.cents())
        .bind(decimal_text(valid.quantity))
        .bind(valid.unit)
        .bind(valid.includes_tax)
        .bind(valid.discount.bps() as i64)
        .bind(Utc::now())
        .bind(id)
        .bind(current.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let found = current_version(&mut tx, id).await?;
            return Err(DbError::Conflict {
                entity: ENTITY.to_string(),
                id: id.to_string(),
                expected: current.version,
                found,
            });
        }

        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        if previous != valid.quantity {
            let change = QuantityChange {
                previous,
                new: valid.quantity,
            };
            let mut details = format!(
                "Stock modified: {} -> {} ({})",
                previous.normalize(),
                valid.quantity.normalize(),
                signed(change.delta())
            );
            if let Some(notes) = notes {
                details.push_str(". ");
                details.push_str(notes);
            }
            append_audit(&mut tx, id, AuditAction::Update, &details, user_id, Some(change)).await?;
        } else if let Some(notes) = notes {
            append_audit(&mut tx, id, AuditAction::Update, notes, user_id, None).await?;
        }

        tx.commit().await?;

        info!(id = %id, "Stock item updated");
        self.get_required(id).await
    }

    /// Applies a sale or return movement. The result floors at zero.
    pub async fn adjust_quantity(
        &self,
        id: &str,
        delta: Decimal,
        user_id: &str,
        movement: StockMovement,
    ) -> DbResult<StockItem> {
        let mut tx = self.pool.begin().await?;
        adjust_quantity_in(&mut tx, id, delta, user_id, movement, None).await?;
        tx.commit().await?;
        self.get_required(id).await
    }

    /// Deletes a stock item. Deleting a missing item is a no-op.
    ///
    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &str, user_id: &str, policy: DeletePolicy) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        if fetch_live_row(&mut tx, id).await?.is_none() {
            debug!(id = %id, "Delete of missing stock item ignored");
            return Ok(false);
        }

        match policy {
            DeletePolicy::Purge => {
                sqlx::query("DELETE FROM items WHERE id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            DeletePolicy::Tombstone => {
                sqlx::query(
                    "UPDATE items SET deleted_at = ?1, updated_at = ?1, version = version + 1 WHERE id = ?2",
                )
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await?;
                append_audit(&mut tx, id, AuditAction::Delete, "Item deleted", user_id, None)
                    .await?;
            }
        }

        tx.commit().await?;

        info!(id = %id, user = %user_id, policy = ?policy, "Stock item deleted");
        Ok(true)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a live stock item with its full history.
    pub async fn get(&self, id: &str) -> DbResult<Option<StockItem>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_live_row(&mut conn, id).await? else {
            return Ok(None);
        };
        drop(conn);

        let history = self.history(id).await?;
        Ok(Some(row.into_item(history)?))
    }

    /// Like `get`, but a missing item is an error.
    pub async fn get_required(&self, id: &str) -> DbResult<StockItem> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))
    }

    /// All live stock items, by name.
    pub async fn list(&self) -> DbResult<Vec<StockItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE, id"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Case-insensitive substring search on name, barcode, or both.
    pub async fn search(
        &self,
        term: &str,
        field: SearchField,
        limit: u32,
    ) -> DbResult<Vec<StockItem>> {
        let term = term.trim();
        debug!(term = %term, field = ?field, limit, "Searching stock items");

        let filter = match field {
            SearchField::All => "(name LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\')",
            SearchField::Name => "name LIKE ?1 ESCAPE '\\'",
            SearchField::Barcode => "barcode LIKE ?1 ESCAPE '\\'",
        };
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE deleted_at IS NULL AND {filter} \
             ORDER BY name COLLATE NOCASE, id LIMIT ?2"
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(like_pattern(term))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Exact barcode match. Barcodes are not unique; the first by name wins.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<StockItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE deleted_at IS NULL AND barcode = ?1 \
             ORDER BY name COLLATE NOCASE, id LIMIT 1"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Number of live stock items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Audit history of an item, oldest first. Tombstoned items keep theirs.
    pub async fn history(&self, id: &str) -> DbResult<Vec<AuditRecord>> {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM history WHERE item_id = ?1 ORDER BY seq");
        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(HistoryRow::into_record).collect()
    }

    /// Attaches histories to item rows with one history query.
    async fn hydrate(&self, rows: Vec<ItemRow>) -> DbResult<Vec<StockItem>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {HISTORY_COLUMNS} FROM history WHERE item_id IN ("
        ));
        {
            let mut ids = qb.separated(", ");
            for row in &rows {
                ids.push_bind(row.id.clone());
            }
            ids.push_unseparated(") ORDER BY seq");
        }

        let mut by_item: HashMap<String, Vec<AuditRecord>> = HashMap::new();
        for history_row in qb.build_query_as::<HistoryRow>().fetch_all(&self.pool).await? {
            let record = history_row.into_record()?;
            by_item.entry(record.item_id.clone()).or_default().push(record);
        }

        rows.into_iter()
            .map(|row| {
                let history = by_item.remove(&row.id).unwrap_or_default();
                row.into_item(history)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bodega_core::CoreError;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn harina(quantity: Decimal) -> StockItemInput {
        StockItemInput {
            name: "Harina P.A.N.".to_string(),
            barcode: "7591002100011".to_string(),
            buying_price: Some(Money::from_cents(90)),
            selling_price: Some(Money::from_cents(110)),
            quantity,
            unit: Unit::Item,
            includes_tax: true,
            discount_percent: Decimal::ZERO,
            expected_version: None,
        }
    }

    #[tokio::test]
    async fn test_create_appends_create_record() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(50)), "admin").await.unwrap();

        assert_eq!(item.quantity, dec!(50));
        assert_eq!(item.version, 1);
        assert_eq!(item.history.len(), 1);
        let record = &item.history[0];
        assert_eq!(record.action, AuditAction::Create);
        assert_eq!(record.user_id, "admin");
        assert_eq!(record.quantity_change.unwrap().new, dec!(50));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = setup().await;

        let mut no_price = harina(dec!(1));
        no_price.selling_price = None;
        assert!(matches!(
            db.stock().create(&no_price, "admin").await,
            Err(DbError::Rejected(CoreError::Validation(_)))
        ));

        let fractional = harina(dec!(1.5));
        assert!(db.stock().create(&fractional, "admin").await.is_err());
        assert_eq!(db.stock().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_records_quantity_change_with_notes() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(50)), "admin").await.unwrap();

        let updated = db
            .stock()
            .update(&item.id, &harina(dec!(47)), "admin", Some("Recount"))
            .await
            .unwrap();

        assert_eq!(updated.quantity, dec!(47));
        assert_eq!(updated.version, 2);
        let last = updated.history.last().unwrap();
        assert_eq!(last.action, AuditAction::Update);
        assert_eq!(last.details, "Stock modified: 50 -> 47 (-3). Recount");
        assert_eq!(last.quantity_change.unwrap().delta(), dec!(-3));
    }

    #[tokio::test]
    async fn test_update_without_quantity_change() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(50)), "admin").await.unwrap();

        let mut renamed = harina(dec!(50));
        renamed.name = "Harina PAN 1kg".to_string();
        let updated = db.stock().update(&item.id, &renamed, "admin", None).await.unwrap();
        assert_eq!(updated.name, "Harina PAN 1kg");
        assert_eq!(updated.history.len(), 1);

        let noted = db
            .stock()
            .update(&item.id, &renamed, "admin", Some("New supplier"))
            .await
            .unwrap();
        assert_eq!(noted.history.len(), 2);
        assert!(noted.history[1].quantity_change.is_none());
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(50)), "admin").await.unwrap();

        let mut first = harina(dec!(40));
        first.expected_version = Some(item.version);
        db.stock().update(&item.id, &first, "admin", None).await.unwrap();

        let mut stale = harina(dec!(45));
        stale.expected_version = Some(item.version);
        let err = db.stock().update(&item.id, &stale, "admin", None).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { expected: 1, found: 2, .. }));
        assert_eq!(db.stock().get_required(&item.id).await.unwrap().quantity, dec!(40));
    }

    #[tokio::test]
    async fn test_adjust_clamps_at_zero() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(2)), "admin").await.unwrap();

        let after = db
            .stock()
            .adjust_quantity(&item.id, dec!(-5), "vendedor", StockMovement::Sale)
            .await
            .unwrap();

        assert_eq!(after.quantity, Decimal::ZERO);
        let change = after.history.last().unwrap().quantity_change.unwrap();
        assert_eq!(change.previous, dec!(2));
        assert_eq!(change.new, Decimal::ZERO);
        assert_eq!(after.history.last().unwrap().action, AuditAction::Sale);
    }

    #[tokio::test]
    async fn test_adjust_on_empty_stock_writes_nothing() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(2)), "admin").await.unwrap();
        let emptied = db
            .stock()
            .adjust_quantity(&item.id, dec!(-2), "vendedor", StockMovement::Sale)
            .await
            .unwrap();
        assert_eq!(emptied.history.len(), 2);

        let again = db
            .stock()
            .adjust_quantity(&item.id, dec!(-2), "vendedor", StockMovement::Sale)
            .await
            .unwrap();

        assert_eq!(again.quantity, Decimal::ZERO);
        assert_eq!(again.version, emptied.version);
        assert_eq!(again.history.len(), 2);
        assert!(again
            .history
            .iter()
            .filter_map(|r| r.quantity_change)
            .all(|c| c.previous != c.new));
    }

    #[tokio::test]
    async fn test_create_uses_configured_currency() {
        let db = Database::new(DbConfig::in_memory().base_currency("usd"))
            .await
            .unwrap();
        let item = db.stock().create(&harina(dec!(5)), "admin").await.unwrap();
        assert_eq!(item.currency, "USD");

        let default = setup().await;
        let item = default.stock().create(&harina(dec!(5)), "admin").await.unwrap();
        assert_eq!(item.currency, bodega_core::BASE_CURRENCY);
    }

    #[tokio::test]
    async fn test_delete_purge_is_idempotent() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(5)), "admin").await.unwrap();

        assert!(db.stock().delete(&item.id, "admin", DeletePolicy::Purge).await.unwrap());
        assert!(!db.stock().delete(&item.id, "admin", DeletePolicy::Purge).await.unwrap());

        assert!(db.stock().get(&item.id).await.unwrap().is_none());
        assert!(db.stock().history(&item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_tombstone_keeps_history() {
        let db = setup().await;
        let item = db.stock().create(&harina(dec!(5)), "admin").await.unwrap();

        db.stock().delete(&item.id, "admin", DeletePolicy::Tombstone).await.unwrap();
        db.stock().delete(&item.id, "admin", DeletePolicy::Tombstone).await.unwrap();

        assert!(db.stock().get(&item.id).await.unwrap().is_none());
        assert_eq!(db.stock().count().await.unwrap(), 0);

        let history = db.stock().history(&item.id).await.unwrap();
        let actions: Vec<_> = history.iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![AuditAction::Create, AuditAction::Delete]);
    }

    #[tokio::test]
    async fn test_search_and_barcode_lookup() {
        let db = setup().await;
        db.stock().create(&harina(dec!(5)), "admin").await.unwrap();

        let mut arroz = harina(dec!(30));
        arroz.name = "Arroz Primor".to_string();
        arroz.barcode = "7591002200022".to_string();
        arroz.unit = Unit::Weight;
        db.stock().create(&arroz, "admin").await.unwrap();

        let by_name = db.stock().search("arroz", SearchField::Name, 20).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].unit, Unit::Weight);

        let by_barcode = db.stock().search("7591002", SearchField::Barcode, 20).await.unwrap();
        assert_eq!(by_barcode.len(), 2);

        assert!(db.stock().search("arroz", SearchField::Barcode, 20).await.unwrap().is_empty());

        let found = db.stock().find_by_barcode("7591002100011").await.unwrap().unwrap();
        assert_eq!(found.name, "Harina P.A.N.");
        assert_eq!(found.history.len(), 1);

        let all = db.stock().list().await.unwrap();
        let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Arroz Primor", "Harina P.A.N."]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn quantity_never_negative_and_every_move_is_audited(
            start in 0i64..20,
            moves in proptest::collection::vec((-10i64..10, any::<bool>()), 1..12),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let db = setup().await;
                let item = db.stock().create(&harina(Decimal::from(start)), "admin").await.unwrap();

                let mut on_hand = start;
                let mut recorded = 1;
                for (delta, is_sale) in &moves {
                    let next = (on_hand + delta).max(0);
                    if next != on_hand {
                        recorded += 1;
                    }
                    on_hand = next;

                    let movement = if *is_sale { StockMovement::Sale } else { StockMovement::Return };
                    let after = db
                        .stock()
                        .adjust_quantity(&item.id, Decimal::from(*delta), "admin", movement)
                        .await
                        .unwrap();
                    assert!(after.quantity >= Decimal::ZERO);
                }

                let final_item = db.stock().get_required(&item.id).await.unwrap();
                assert_eq!(final_item.history.len(), recorded);

                let mut expected = Decimal::ZERO;
                for record in &final_item.history {
                    let change = record.quantity_change.unwrap();
                    assert_eq!(change.previous, expected);
                    expected = change.new;
                }
                assert_eq!(expected, final_item.quantity);
            });
        }
    }
}
