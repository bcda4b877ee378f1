//! # Cart Commands
//!
//! Building the open sale. Availability is always checked against the live
//! stock item, never against the copy frozen in the cart line.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌────────────┐     ┌──────────┐     │
//! │  │  Empty   │────►│  Lines   │────►│ Collecting │────►│ Committed│     │
//! │  │  Cart    │     │          │     │  Payment   │     │  (ledger)│     │
//! │  └──────────┘     └──────────┘     └────────────┘     └──────────┘     │
//! │       ▲                │                 │                  │          │
//! │       │           add_to_cart       add_payment             │          │
//! │       │           set_quantity      (checkout.rs)           │          │
//! │       │           toggle_discount        │                  │          │
//! │       │                │            cancel_checkout ──► Lines          │
//! │       └──── discard_cart / save_cart ◄──┘                   │          │
//! │       └─────────────────────────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{Cart, CartLine, CartSummary};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState};

pub(crate) fn summarize(cart: &Cart, config: &ConfigState) -> CartSummary {
    cart.summary(config.tax_rate())
}

/// Current lines, payments, and derived totals.
pub async fn get_cart(cart: &CartState, config: &ConfigState) -> CartSummary {
    debug!("get_cart command");
    cart.with_cart(|c| summarize(c, config)).await
}

/// Adds `quantity` of a stock item, merging with an existing line.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown or deleted item
/// - `INSUFFICIENT_STOCK` when the cart would hold more than is on hand
/// - `VALIDATION_ERROR` for a fractional count of a discrete item
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    item_id: &str,
    quantity: Decimal,
) -> Result<CartSummary, ApiError> {
    debug!(item = %item_id, quantity = %quantity, "add_to_cart command");

    let item = db
        .inner()
        .stock()
        .get(item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", item_id))?;

    let mut guard = cart.lock().await;
    guard.add_line(&item, quantity)?;
    Ok(summarize(&guard, config))
}

/// Scanner path: looks the item up by exact barcode, then adds it.
pub async fn add_barcode_to_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    barcode: &str,
    quantity: Decimal,
) -> Result<CartSummary, ApiError> {
    let item = db
        .inner()
        .stock()
        .find_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Barcode", barcode))?;

    let mut guard = cart.lock().await;
    guard.add_line(&item, quantity)?;
    Ok(summarize(&guard, config))
}

/// Sets a line's quantity. Zero or less removes the line.
pub async fn set_line_quantity(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    item_id: &str,
    quantity: Decimal,
) -> Result<CartSummary, ApiError> {
    debug!(item = %item_id, quantity = %quantity, "set_line_quantity command");

    let live = db.inner().stock().get(item_id).await?;

    let mut guard = cart.lock().await;
    match live {
        Some(item) => guard.set_line_quantity(item_id, quantity, &item)?,
        // The item was deleted since it was added; the line can only go
        None if quantity <= Decimal::ZERO => guard.remove_line(item_id),
        None => return Err(ApiError::not_found("Stock item", item_id)),
    }
    Ok(summarize(&guard, config))
}

pub async fn remove_from_cart(
    cart: &CartState,
    config: &ConfigState,
    item_id: &str,
) -> CartSummary {
    debug!(item = %item_id, "remove_from_cart command");
    cart.with_cart_mut(|c| {
        c.remove_line(item_id);
        summarize(c, config)
    })
    .await
}

/// Turns the item's own discount on or off for this line.
pub async fn toggle_line_discount(
    cart: &CartState,
    config: &ConfigState,
    item_id: &str,
    apply: bool,
) -> Result<CartSummary, ApiError> {
    let mut guard = cart.lock().await;
    guard.toggle_line_discount(item_id, apply)?;
    Ok(summarize(&guard, config))
}

pub async fn set_notes(cart: &CartState, config: &ConfigState, notes: String) -> CartSummary {
    cart.with_cart_mut(|c| {
        c.set_notes(notes);
        summarize(c, config)
    })
    .await
}

/// Lines whose name or barcode contains `term`.
pub async fn filter_cart(cart: &CartState, term: &str) -> Vec<CartLine> {
    cart.with_cart(|c| c.filter(term).into_iter().cloned().collect())
        .await
}

/// Drops the whole open sale: lines, payments, and notes.
pub async fn discard_cart(cart: &CartState, config: &ConfigState) -> CartSummary {
    debug!("discard_cart command");
    cart.with_cart_mut(|c| {
        c.clear();
        summarize(c, config)
    })
    .await
}
