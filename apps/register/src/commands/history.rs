//! # Transaction History Commands
//!
//! Read access to the ledger, plus the two writes a committed sale still
//! accepts: returns and receipt images.

use bodega_core::Transaction;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionState};

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 500;

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT)
}

/// Every operator's transactions, newest first.
pub async fn list_transactions(db: &DbState, limit: Option<u32>) -> Result<Vec<Transaction>, ApiError> {
    let limit = clamp_limit(limit);
    debug!(limit, "list_transactions command");
    Ok(db.inner().ledger().list(limit).await?)
}

/// The acting operator's own transactions, newest first.
pub async fn list_my_transactions(
    db: &DbState,
    session: &SessionState,
    limit: Option<u32>,
) -> Result<Vec<Transaction>, ApiError> {
    let operator = session.require_current().await?;
    Ok(db
        .inner()
        .ledger()
        .list_by_user(&operator.id, clamp_limit(limit))
        .await?)
}

/// Transactions matching `query` by id or by the name of an item sold,
/// newest first. A blank query lists like `list_transactions`.
pub async fn search_history(
    db: &DbState,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<Transaction>, ApiError> {
    let limit = clamp_limit(limit);
    debug!(query = %query, limit, "search_history command");
    Ok(db.inner().ledger().search(query, limit).await?)
}

pub async fn get_transaction(db: &DbState, id: &str) -> Result<Transaction, ApiError> {
    db.inner()
        .ledger()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", id))
}

/// Takes back `quantity` of one sold line and restocks it.
///
/// ## Errors
/// - `VALIDATION_ERROR` unless `0 < quantity ≤ sold − already returned`
/// - `NOT_FOUND` when the item was never on the sale or has been deleted
pub async fn return_item(
    db: &DbState,
    session: &SessionState,
    transaction_id: &str,
    item_id: &str,
    quantity: Decimal,
) -> Result<Transaction, ApiError> {
    let operator = session.require_current().await?;
    let transaction = db
        .inner()
        .ledger()
        .return_item(transaction_id, item_id, quantity, &operator.id)
        .await?;
    info!(
        transaction = %transaction_id,
        item = %item_id,
        operator = %operator.id,
        "return_item complete"
    );
    Ok(transaction)
}

/// Appends a receipt image (encoded payload or URI) to a transaction.
pub async fn attach_image(
    db: &DbState,
    config: &ConfigState,
    transaction_id: &str,
    image: String,
) -> Result<Transaction, ApiError> {
    debug!(transaction = %transaction_id, size = image.len(), "attach_image command");
    Ok(db
        .inner()
        .ledger()
        .attach_image(transaction_id, image, config.max_image_bytes)
        .await?)
}
