//! # Cart State
//!
//! Holds the one open sale of the register.
//!
//! ## Thread Safety
//! The cart sits behind `Arc<tokio::sync::Mutex<Cart>>`:
//! 1. Every command that touches the cart locks it first
//! 2. The checkout command keeps the guard across the whole database
//!    commit, so no other cart mutation can interleave with it
//! 3. A tokio mutex is used because the guard is held across `.await`
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator Action         Command                 Cart State Change      │
//! │  ───────────────         ───────                 ─────────────────      │
//! │                                                                         │
//! │  Scan item ─────────────► add_to_cart() ───────► lines.push / += qty   │
//! │  Change quantity ───────► set_line_quantity() ─► line.qty = n          │
//! │  Toggle discount ───────► toggle_discount() ───► line.apply_discount   │
//! │  Take payment ──────────► add_payment() ───────► payments.push         │
//! │                                 │                                       │
//! │                          settled? commit, then clear()                  │
//! │  Cancel checkout ───────► cancel_checkout() ───► payments, notes clear │
//! │  Discard sale ──────────► discard_cart() ──────► clear()               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bodega_core::Cart;
use tokio::sync::{Mutex, MutexGuard};

/// Shared handle to the open cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new CartState with an empty cart.
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Exclusive access to the cart until the guard drops.
    pub async fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().await
    }

    /// Executes a function with read access to the cart.
    ///
    /// ```rust,ignore
    /// let count = cart_state.with_cart(|cart| cart.lines().len()).await;
    /// ```
    pub async fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().await;
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub async fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().await;
        f(&mut cart)
    }
}
