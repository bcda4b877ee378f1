//! # Inventory Commands
//!
//! Stock item lookup for everyone, and create/update/delete for admins.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Item Search Flow                                     │
//! │                                                                         │
//! │  Operator types or scans "7590001001001"                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Is query a barcode? (8-13 digits)        │                         │
//! │  │  YES: Try exact barcode lookup first      │──► Found? Return [1]    │
//! │  │  NO:  Substring search (name / barcode)   │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<StockItem> with history                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use bodega_core::{AuditRecord, SearchField, StockItem, StockItemInput};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionState};

/// Default and maximum number of search results.
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

/// 8-13 ASCII digits: EAN-8, UPC-A, EAN-13.
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

/// Searches live stock items by name, barcode, or both.
///
/// ## Arguments
/// * `query` - Substring, case-insensitive. Empty lists everything up to `limit`.
/// * `field` - Which column(s) to match
/// * `limit` - Maximum results (default: 20, max: 100)
pub async fn search_items(
    db: &DbState,
    query: &str,
    field: SearchField,
    limit: Option<u32>,
) -> Result<Vec<StockItem>, ApiError> {
    let start = Instant::now();
    let query = query.trim();
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);

    debug!(query = %query, field = ?field, limit, "search_items command");

    // Scanners type a whole barcode at once; answer with the exact hit
    if field != SearchField::Name && is_barcode_query(query) {
        if let Some(item) = db.inner().stock().find_by_barcode(query).await? {
            debug!(barcode = %query, "Exact barcode hit");
            return Ok(vec![item]);
        }
    }

    let items = db.inner().stock().search(query, field, limit).await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = items.len(),
        query = %query,
        "search_items complete"
    );
    Ok(items)
}

/// Every live stock item, by name.
pub async fn list_items(db: &DbState) -> Result<Vec<StockItem>, ApiError> {
    Ok(db.inner().stock().list().await?)
}

pub async fn get_item(db: &DbState, id: &str) -> Result<StockItem, ApiError> {
    debug!(id = %id, "get_item command");
    db.inner()
        .stock()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", id))
}

/// Audit history of an item, oldest first.
pub async fn item_history(db: &DbState, id: &str) -> Result<Vec<AuditRecord>, ApiError> {
    Ok(db.inner().stock().history(id).await?)
}

/// Creates a stock item as the acting admin.
pub async fn create_item(
    db: &DbState,
    session: &SessionState,
    input: StockItemInput,
) -> Result<StockItem, ApiError> {
    let operator = session.require_elevated().await?;
    debug!(name = %input.name, "create_item command");
    Ok(db.inner().stock().create(&input, &operator.id).await?)
}

/// Replaces an item's fields as the acting admin; `notes` end up in the
/// audit record.
pub async fn update_item(
    db: &DbState,
    session: &SessionState,
    id: &str,
    input: StockItemInput,
    notes: Option<String>,
) -> Result<StockItem, ApiError> {
    let operator = session.require_elevated().await?;
    debug!(id = %id, "update_item command");
    Ok(db
        .inner()
        .stock()
        .update(id, &input, &operator.id, notes.as_deref())
        .await?)
}

/// Deletes an item under the configured policy. Missing ids are a no-op.
pub async fn delete_item(
    db: &DbState,
    session: &SessionState,
    config: &ConfigState,
    id: &str,
) -> Result<bool, ApiError> {
    let operator = session.require_elevated().await?;
    Ok(db
        .inner()
        .stock()
        .delete(id, &operator.id, config.delete_policy)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bodega_core::{Money, Unit};
    use bodega_db::{Database, DbConfig};
    use rust_decimal_macros::dec;

    fn input(name: &str, barcode: &str) -> StockItemInput {
        StockItemInput {
            name: name.to_string(),
            barcode: barcode.to_string(),
            buying_price: Some(Money::from_cents(90)),
            selling_price: Some(Money::from_cents(110)),
            quantity: dec!(50),
            unit: Unit::Item,
            includes_tax: true,
            discount_percent: dec!(0),
            expected_version: None,
        }
    }

    async fn setup() -> (DbState, SessionState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), SessionState::default())
    }

    #[test]
    fn test_is_barcode_query() {
        assert!(is_barcode_query("7590001001001"));
        assert!(is_barcode_query("12345678"));
        assert!(!is_barcode_query("1234567"));
        assert!(!is_barcode_query("harina"));
    }

    #[tokio::test]
    async fn test_barcode_query_returns_exact_hit() {
        let (db, session) = setup().await;
        create_item(&db, &session, input("Harina P.A.N.", "7590001001001")).await.unwrap();
        create_item(&db, &session, input("Harina Juana", "75900010010019")).await.unwrap();

        let hits = search_items(&db, "7590001001001", SearchField::All, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Harina P.A.N.");

        let by_name = search_items(&db, "harina", SearchField::Name, None).await.unwrap();
        assert_eq!(by_name.len(), 2);
    }

    #[tokio::test]
    async fn test_clerk_cannot_edit_inventory() {
        let (db, session) = setup().await;
        session.select("2").await.unwrap();

        let err = create_item(&db, &session, input("Harina", "1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(list_items(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_carries_operator_id() {
        let (db, session) = setup().await;
        let item = create_item(&db, &session, input("Aceite", "3")).await.unwrap();

        let mut edit = input("Aceite", "3");
        edit.quantity = dec!(47);
        update_item(&db, &session, &item.id, edit, Some("Conteo".to_string()))
            .await
            .unwrap();

        let history = item_history(&db, &item.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.user_id == "1"));
        assert!(history[1].details.contains("Conteo"));

        let config = ConfigState::default();
        assert!(delete_item(&db, &session, &config, &item.id).await.unwrap());
        assert!(!delete_item(&db, &session, &config, &item.id).await.unwrap());
        assert_eq!(get_item(&db, &item.id).await.unwrap_err().code, ErrorCode::NotFound);
    }
}
