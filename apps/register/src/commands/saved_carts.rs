//! # Saved Cart Commands
//!
//! Parks the open sale under a name and brings it back later.
//!
//! ```text
//!   live cart ──save_cart──► archive (frozen lines, payments, notes)
//!       ▲                         │
//!       └──────load_saved_cart────┘   working set replaced, order kept
//! ```
//!
//! Stock is not held while a cart sits in the archive; availability is
//! checked again on the next edit and at commit.

use bodega_core::{CartSummary, SavedCart};
use tracing::{debug, info};

use super::cart::summarize;
use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState};

/// Archives the live cart and clears it.
///
/// `name` defaults to `Ticket N`.
pub async fn save_cart(
    db: &DbState,
    cart: &CartState,
    name: Option<String>,
) -> Result<SavedCart, ApiError> {
    let repo = db.inner().saved_carts();

    let mut guard = cart.lock().await;
    let name = match name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => repo.next_default_name().await?,
    };
    let saved = guard.snapshot(name)?;
    repo.save(&saved).await?;
    guard.clear();

    info!(id = %saved.id, name = %saved.name, lines = saved.lines.len(), "Cart saved");
    Ok(saved)
}

/// Replaces the live cart with a saved one. The archived copy stays.
pub async fn load_saved_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    id: &str,
) -> Result<CartSummary, ApiError> {
    debug!(id = %id, "load_saved_cart command");
    let saved = db.inner().saved_carts().get_required(id).await?;

    let mut guard = cart.lock().await;
    if !guard.is_empty() {
        debug!(lines = guard.lines().len(), "Discarding unsaved working set");
    }
    guard.restore(&saved);
    Ok(summarize(&guard, config))
}

/// Archived carts, newest first.
pub async fn list_saved_carts(db: &DbState) -> Result<Vec<SavedCart>, ApiError> {
    Ok(db.inner().saved_carts().list().await?)
}

/// Removes an archived cart. Missing ids are a no-op.
pub async fn delete_saved_cart(db: &DbState, id: &str) -> Result<bool, ApiError> {
    Ok(db.inner().saved_carts().delete(id).await?)
}
