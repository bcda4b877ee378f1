//! # Ledger Repository
//!
//! Committed sales, post-sale returns, and receipt images.
//!
//! ## Sale Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   commit_sale: SINGLE TRANSACTION                       │
//! │                                                                         │
//! │  for each cart line:                                                   │
//! │      UPDATE items.quantity -= requested   (clamped at 0)               │
//! │      INSERT history 'sale'                                             │
//! │  INSERT transactions (frozen subtotal / tax / total, payments)         │
//! │  INSERT transaction_lines (quantity_returned = 0)                      │
//! │                                                                         │
//! │  COMMIT ← all of it, or none of it                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After commit only `quantity_returned` and `images` ever change.
//! Transactions are never deleted.

use std::collections::HashMap;

use bodega_core::{
    validation, Cart, CoreError, Discount, Money, PendingPayment, StockMovement, TaxRate,
    Transaction, TransactionLine, Unit, ValidationError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::inventory::adjust_quantity_in;
use super::{decimal_text, like_pattern, parse_decimal};
use crate::error::{DbError, DbResult};

const TRANSACTION_COLUMNS: &str =
    "id, timestamp, user_id, subtotal, tax, total, payments, notes, images";

const LINE_COLUMNS: &str = "id, transaction_id, item_id, name, barcode, unit, unit_price, \
     discount_bps, apply_discount, includes_tax, quantity, quantity_returned, line_total";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    timestamp: DateTime<Utc>,
    user_id: String,
    subtotal: i64,
    tax: i64,
    total: i64,
    payments: String,
    notes: String,
    images: String,
}

impl TransactionRow {
    fn into_transaction(self, lines: Vec<TransactionLine>) -> DbResult<Transaction> {
        let payments: Vec<PendingPayment> = serde_json::from_str(&self.payments)?;
        let images: Vec<String> = serde_json::from_str(&self.images)?;
        Ok(Transaction {
            id: self.id,
            timestamp: self.timestamp,
            user_id: self.user_id,
            lines,
            subtotal: Money::from_cents(self.subtotal),
            tax: Money::from_cents(self.tax),
            total: Money::from_cents(self.total),
            payments,
            notes: self.notes,
            images,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    transaction_id: String,
    item_id: String,
    name: String,
    barcode: String,
    unit: Unit,
    unit_price: i64,
    discount_bps: i64,
    apply_discount: bool,
    includes_tax: bool,
    quantity: String,
    quantity_returned: String,
    line_total: i64,
}

impl LineRow {
    fn into_line(self) -> DbResult<TransactionLine> {
        Ok(TransactionLine {
            quantity: parse_decimal("transaction_lines.quantity", &self.quantity)?,
            quantity_returned: parse_decimal(
                "transaction_lines.quantity_returned",
                &self.quantity_returned,
            )?,
            id: self.id,
            transaction_id: self.transaction_id,
            item_id: self.item_id,
            name: self.name,
            barcode: self.barcode,
            unit: self.unit,
            unit_price: Money::from_cents(self.unit_price),
            discount: Discount::from_bps(self.discount_bps.clamp(0, 10_000) as u32),
            apply_discount: self.apply_discount,
            includes_tax: self.includes_tax,
            line_total: Money::from_cents(self.line_total),
        })
    }
}

/// Repository for committed transactions.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Commits a settled cart as one atomic unit.
    ///
    /// The cart itself is left untouched; the caller clears it once this
    /// returns `Ok`.
    ///
    /// ## Errors
    /// - `Rejected(EmptyCart)` for a cart with no lines
    /// - `NotFound` when a line's stock item was deleted meanwhile
    /// - any storage failure; nothing is written in either case
    pub async fn commit_sale(
        &self,
        cart: &Cart,
        user_id: &str,
        rate: TaxRate,
    ) -> DbResult<Transaction> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let id = Uuid::new_v4().to_string();
        let timestamp = Utc::now();
        let totals = cart.totals(rate);
        let lines: Vec<TransactionLine> = cart
            .lines()
            .iter()
            .map(|line| TransactionLine::from_cart_line(&id, line))
            .collect();

        debug!(id = %id, lines = lines.len(), total = %totals.total, "Committing sale");

        let mut tx = self.pool.begin().await?;

        for line in &lines {
            adjust_quantity_in(
                &mut tx,
                &line.item_id,
                -line.quantity,
                user_id,
                StockMovement::Sale,
                Some(&id),
            )
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, timestamp, user_id, subtotal, tax, total, payments, notes, images
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]')
            "#,
        )
        .bind(&id)
        .bind(timestamp)
        .bind(user_id)
        .bind(totals.subtotal.cents())
        .bind(totals.tax.cents())
        .bind(totals.total.cents())
        .bind(serde_json::to_string(cart.payments())?)
        .bind(cart.notes())
        .execute(&mut *tx)
        .await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (
                    id, transaction_id, position, item_id, name, barcode, unit,
                    unit_price, discount_bps, apply_discount, includes_tax,
                    quantity, quantity_returned, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )
            .bind(&line.id)
            .bind(&id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(&line.barcode)
            .bind(line.unit)
            .bind(line.unit_price.cents())
            .bind(line.discount.bps() as i64)
            .bind(line.apply_discount)
            .bind(line.includes_tax)
            .bind(decimal_text(line.quantity))
            .bind(decimal_text(line.quantity_returned))
            .bind(line.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %id,
            user = %user_id,
            total = %totals.total,
            paid = %cart.amount_paid(),
            "Sale committed"
        );

        Ok(Transaction {
            id,
            timestamp,
            user_id: user_id.to_string(),
            lines,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            payments: cart.payments().to_vec(),
            notes: cart.notes().to_string(),
            images: Vec::new(),
        })
    }

    /// Returns part of a sold line and restocks it, atomically.
    ///
    /// Frozen financial totals are never changed.
    ///
    /// ## Errors
    /// - `Rejected(Validation)` unless `0 < quantity ≤ sold − returned`
    /// - `NotFound` for an unknown transaction/line, or a stock item that
    ///   has since been deleted
    pub async fn return_item(
        &self,
        transaction_id: &str,
        item_id: &str,
        quantity: Decimal,
        user_id: &str,
    ) -> DbResult<Transaction> {
        debug!(transaction = %transaction_id, item = %item_id, quantity = %quantity, "Returning item");

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines WHERE transaction_id = ?1 AND item_id = ?2"
        );
        let row = sqlx::query_as::<_, LineRow>(&sql)
            .bind(transaction_id)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                DbError::not_found("Transaction line", format!("{transaction_id}/{item_id}"))
            })?;
        let line = row.into_line()?;

        validation::validate_return_quantity(quantity, line.returnable())?;
        validation::validate_unit_granularity(quantity, line.unit)?;

        let returned = line.quantity_returned + quantity;
        sqlx::query("UPDATE transaction_lines SET quantity_returned = ?1 WHERE id = ?2")
            .bind(decimal_text(returned))
            .bind(&line.id)
            .execute(&mut *tx)
            .await?;

        adjust_quantity_in(
            &mut tx,
            item_id,
            quantity,
            user_id,
            StockMovement::Return,
            Some(transaction_id),
        )
        .await?;

        tx.commit().await?;

        info!(
            transaction = %transaction_id,
            item = %item_id,
            quantity = %quantity,
            returned_total = %returned,
            "Return recorded"
        );
        self.get_required(transaction_id).await
    }

    /// Appends an encoded image (or URI) to a transaction.
    pub async fn attach_image(
        &self,
        transaction_id: &str,
        image: String,
        max_bytes: usize,
    ) -> DbResult<Transaction> {
        if image.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "image".to_string(),
            }
            .into());
        }
        validation::validate_image_size(image.len(), max_bytes)?;

        let mut tx = self.pool.begin().await?;

        let stored: Option<String> =
            sqlx::query_scalar("SELECT images FROM transactions WHERE id = ?1")
                .bind(transaction_id)
                .fetch_optional(&mut *tx)
                .await?;
        let stored = stored.ok_or_else(|| DbError::not_found("Transaction", transaction_id))?;

        let mut images: Vec<String> = serde_json::from_str(&stored)?;
        images.push(image);

        sqlx::query("UPDATE transactions SET images = ?1 WHERE id = ?2")
            .bind(serde_json::to_string(&images)?)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(transaction = %transaction_id, images = images.len(), "Image attached");
        self.get_required(transaction_id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a transaction with its lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn get_required(&self, id: &str) -> DbResult<Transaction> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// Most recent transactions first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY timestamp DESC, rowid DESC LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Most recent transactions of one operator first.
    pub async fn list_by_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ?1 \
             ORDER BY timestamp DESC, rowid DESC LIMIT ?2"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Transactions whose id contains `term` or that sold an item whose
    /// name contains it (case-insensitive), newest first.
    ///
    /// A blank term lists everything, like [`list`](Self::list).
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Transaction>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list(limit).await;
        }
        debug!(term = %term, limit, "Searching transactions");

        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE id LIKE ?1 ESCAPE '\\' \
                OR EXISTS (SELECT 1 FROM transaction_lines l \
                           WHERE l.transaction_id = transactions.id \
                             AND l.name LIKE ?1 ESCAPE '\\') \
             ORDER BY timestamp DESC, rowid DESC LIMIT ?2"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(like_pattern(term))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Loads the lines of every row with one query, in commit order.
    async fn hydrate(&self, rows: Vec<TransactionRow>) -> DbResult<Vec<Transaction>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines WHERE transaction_id IN ("
        ));
        {
            let mut ids = qb.separated(", ");
            for row in &rows {
                ids.push_bind(row.id.clone());
            }
            ids.push_unseparated(") ORDER BY transaction_id, position");
        }

        let mut by_tx: HashMap<String, Vec<TransactionLine>> = HashMap::new();
        for line_row in qb.build_query_as::<LineRow>().fetch_all(&self.pool).await? {
            let line = line_row.into_line()?;
            by_tx.entry(line.transaction_id.clone()).or_default().push(line);
        }

        rows.into_iter()
            .map(|row| {
                let lines = by_tx.remove(&row.id).unwrap_or_default();
                row.into_transaction(lines)
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
    use bodega_core::{AuditAction, StockItem, StockItemInput};
    use rust_decimal_macros::dec;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock(db: &Database, name: &str, price: i64, qty: Decimal, taxed: bool) -> StockItem {
        let input = StockItemInput {
            name: name.to_string(),
            barcode: format!("759{}", price),
            buying_price: Some(Money::from_cents(price / 2)),
            selling_price: Some(Money::from_cents(price)),
            quantity: qty,
            unit: Unit::Item,
            includes_tax: taxed,
            discount_percent: dec!(10),
            expected_version: None,
        };
        db.stock().create(&input, "admin").await.unwrap()
    }

    #[tokio::test]
    async fn test_commit_decrements_stock_and_freezes_totals() {
        let db = setup().await;
        let a = stock(&db, "Harina", 1000, dec!(10), false).await;
        let b = stock(&db, "Aceite", 2000, dec!(5), true).await;

        let mut cart = Cart::new();
        cart.add_line(&a, dec!(2)).unwrap();
        cart.add_line(&b, dec!(1)).unwrap();
        cart.toggle_line_discount(&b.id, true).unwrap();
        cart.add_payment("Efectivo", Money::from_cents(5000)).unwrap();

        let sale = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap();

        assert_eq!(sale.subtotal.cents(), 3800);
        assert_eq!(sale.tax.cents(), 180);
        assert_eq!(sale.total.cents(), 3980);
        assert_eq!(sale.amount_paid().cents(), 5000);
        assert_eq!(sale.change_given().cents(), 1020);

        let a_after = db.stock().get_required(&a.id).await.unwrap();
        assert_eq!(a_after.quantity, dec!(8));
        let last = a_after.history.last().unwrap();
        assert_eq!(last.action, AuditAction::Sale);
        assert_eq!(last.user_id, "vendedor");

        let stored = db.ledger().get_required(&sale.id).await.unwrap();
        assert_eq!(stored.total, sale.total);
        assert_eq!(stored.payments.len(), 1);
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.lines[0].item_id, a.id);
        assert_eq!(stored.lines[1].line_total.cents(), 1800);
    }

    #[tokio::test]
    async fn test_commit_rolls_back_when_an_item_vanished() {
        let db = setup().await;
        let a = stock(&db, "Harina", 1000, dec!(10), false).await;
        let b = stock(&db, "Aceite", 2000, dec!(5), false).await;

        let mut cart = Cart::new();
        cart.add_line(&a, dec!(2)).unwrap();
        cart.add_line(&b, dec!(1)).unwrap();

        db.stock()
            .delete(&b.id, "admin", bodega_core::DeletePolicy::Purge)
            .await
            .unwrap();

        let err = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert_eq!(db.ledger().count().await.unwrap(), 0);
        let a_after = db.stock().get_required(&a.id).await.unwrap();
        assert_eq!(a_after.quantity, dec!(10));
        assert_eq!(a_after.history.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_rejects_empty_cart() {
        let db = setup().await;
        let err = db
            .ledger()
            .commit_sale(&Cart::new(), "vendedor", TaxRate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_returns_are_bounded_by_what_remains() {
        let db = setup().await;
        let item = stock(&db, "Harina", 110, dec!(10), false).await;

        let mut cart = Cart::new();
        cart.add_line(&item, dec!(4)).unwrap();
        let sale = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap();

        db.ledger().return_item(&sale.id, &item.id, dec!(1), "admin").await.unwrap();

        let err = db
            .ledger()
            .return_item(&sale.id, &item.id, dec!(4), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));

        let after = db.ledger().return_item(&sale.id, &item.id, dec!(3), "admin").await.unwrap();
        assert_eq!(after.lines[0].quantity_returned, dec!(4));
        assert_eq!(after.total, sale.total);

        let restocked = db.stock().get_required(&item.id).await.unwrap();
        assert_eq!(restocked.quantity, dec!(10));
        assert_eq!(restocked.history.last().unwrap().action, AuditAction::Return);
    }

    #[tokio::test]
    async fn test_return_of_unknown_line() {
        let db = setup().await;
        let err = db
            .ledger()
            .return_item("missing", "item", dec!(1), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_attach_image_enforces_ceiling() {
        let db = setup().await;
        let item = stock(&db, "Harina", 110, dec!(10), false).await;
        let mut cart = Cart::new();
        cart.add_line(&item, dec!(1)).unwrap();
        let sale = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap();

        let updated = db
            .ledger()
            .attach_image(&sale.id, "data:image/png;base64,AAAA".to_string(), 1024)
            .await
            .unwrap();
        assert_eq!(updated.images.len(), 1);

        let err = db
            .ledger()
            .attach_image(&sale.id, "x".repeat(1025), 1024)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::PayloadTooLarge { size: 1025, max: 1024 })
        ));
        assert_eq!(db.ledger().get_required(&sale.id).await.unwrap().images.len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_by_user() {
        let db = setup().await;
        let item = stock(&db, "Harina", 110, dec!(10), false).await;

        let mut ids = Vec::new();
        for user in ["admin", "vendedor", "vendedor"] {
            let mut cart = Cart::new();
            cart.add_line(&item, dec!(1)).unwrap();
            ids.push(db.ledger().commit_sale(&cart, user, TaxRate::default()).await.unwrap().id);
        }

        let all = db.ledger().list(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, ids[2]);

        let mine = db.ledger().list_by_user("vendedor", 10).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|t| t.lines.len() == 1));
    }

    #[tokio::test]
    async fn test_search_by_id_and_item_name() {
        let db = setup().await;
        let harina = stock(&db, "Harina P.A.N.", 110, dec!(10), false).await;
        let aceite = stock(&db, "Aceite Mazeite", 350, dec!(10), false).await;

        let mut cart = Cart::new();
        cart.add_line(&harina, dec!(1)).unwrap();
        let first = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap();

        let mut cart = Cart::new();
        cart.add_line(&harina, dec!(1)).unwrap();
        cart.add_line(&aceite, dec!(1)).unwrap();
        let second = db.ledger().commit_sale(&cart, "vendedor", TaxRate::default()).await.unwrap();

        let by_name = db.ledger().search("HARINA", 10).await.unwrap();
        let ids: Vec<_> = by_name.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);
        assert_eq!(by_name[0].lines.len(), 2);

        let by_line = db.ledger().search("mazeite", 10).await.unwrap();
        assert_eq!(by_line.len(), 1);
        assert_eq!(by_line[0].id, second.id);

        let by_id = db.ledger().search(&first.id[..8], 10).await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].id, first.id);

        assert!(db.ledger().search("queso", 10).await.unwrap().is_empty());
        assert!(db.ledger().search("%", 10).await.unwrap().is_empty());
        assert_eq!(db.ledger().search("  ", 10).await.unwrap().len(), 2);
        assert_eq!(db.ledger().search("harina", 1).await.unwrap().len(), 1);
    }
}
