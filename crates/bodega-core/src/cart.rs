//! # Cart (Sale-in-Progress)
//!
//! The open sale: lines that reserve stock, per-line discount toggles,
//! free-text notes, and the partial payments collected so far.
//!
//! ## Reservation Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock on hand: 5                                                       │
//! │                                                                         │
//! │  add_line(3)  → reserved 0 + 3 = 3 ≤ 5   ✓   line qty 3                 │
//! │  add_line(3)  → reserved 3 + 3 = 6 > 5   ✗   InsufficientStock          │
//! │  add_line(2)  → reserved 3 + 2 = 5 ≤ 5   ✓   line qty 5                 │
//! │                                                                         │
//! │  A reservation is arithmetic only. Stock is decremented when the       │
//! │  sale commits, never when a line is added.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Derived values (subtotal, tax, total, amount paid, remaining due) are
//! recomputed on every read from the lines and payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{compute_totals, Totals};
use crate::types::{CartLine, PendingPayment, SavedCart, StockItem, TaxRate};
use crate::validation;

/// The working set of the open sale.
///
/// ## Invariants
/// - At most one line per stock item
/// - Every line has `requested_quantity > 0`
/// - Every payment has `amount > 0`
/// - Payments only exist while the cart has at least one line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    payments: Vec<PendingPayment>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            payments: Vec::new(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn payments(&self) -> &[PendingPayment] {
        &self.payments
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Quantity of `item_id` already held by this cart.
    pub fn reserved_quantity(&self, item_id: &str) -> Decimal {
        self.line(item_id)
            .map(|l| l.requested_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds `quantity` of a live stock item, merging into an existing line.
    ///
    /// ## Errors
    /// - `InsufficientStock` when `quantity ≤ 0` or the cart would then
    ///   hold more than the item has on hand
    /// - `Validation` for a fractional count of a discrete item
    pub fn add_line(&mut self, item: &StockItem, quantity: Decimal) -> CoreResult<()> {
        let reserved = self.reserved_quantity(&item.id);
        let wanted = reserved + quantity;

        if quantity <= Decimal::ZERO || wanted > item.quantity {
            return Err(CoreError::InsufficientStock {
                item: item.name.clone(),
                available: item.quantity - reserved,
                requested: quantity,
            });
        }
        validation::validate_unit_granularity(quantity, item.unit)?;

        match self.lines.iter_mut().find(|l| l.item_id == item.id) {
            Some(line) => line.requested_quantity = wanted,
            None => self.lines.push(CartLine::from_item(item, quantity)),
        }
        Ok(())
    }

    /// Sets a line's quantity against the live stock item.
    ///
    /// A quantity of zero or less removes the line.
    pub fn set_line_quantity(
        &mut self,
        item_id: &str,
        quantity: Decimal,
        live: &StockItem,
    ) -> CoreResult<()> {
        let index = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::not_found("Cart line", item_id))?;

        if quantity <= Decimal::ZERO {
            self.lines.remove(index);
            self.drop_orphaned_payments();
            return Ok(());
        }

        if quantity > live.quantity {
            return Err(CoreError::InsufficientStock {
                item: live.name.clone(),
                available: live.quantity,
                requested: quantity,
            });
        }
        validation::validate_unit_granularity(quantity, live.unit)?;

        self.lines[index].requested_quantity = quantity;
        Ok(())
    }

    /// Removes the line for `item_id`, if any.
    pub fn remove_line(&mut self, item_id: &str) {
        self.lines.retain(|l| l.item_id != item_id);
        self.drop_orphaned_payments();
    }

    /// Turns the item's discount on or off for this line.
    pub fn toggle_line_discount(&mut self, item_id: &str, apply: bool) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::not_found("Cart line", item_id))?;
        line.apply_discount = apply;
        Ok(())
    }

    /// Lines whose name or barcode contains `term` (case-insensitive).
    pub fn filter(&self, term: &str) -> Vec<&CartLine> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.lines.iter().collect();
        }
        self.lines
            .iter()
            .filter(|l| {
                l.name.to_lowercase().contains(&needle) || l.barcode.to_lowercase().contains(&needle)
            })
            .collect()
    }

    // =========================================================================
    // Totals
    // =========================================================================

    pub fn totals(&self, rate: TaxRate) -> Totals {
        compute_totals(&self.lines, rate)
    }

    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// `total - amount_paid`. Negative means change is owed.
    pub fn remaining_due(&self, rate: TaxRate) -> Money {
        self.totals(rate).total - self.amount_paid()
    }

    // =========================================================================
    // Payments & Notes
    // =========================================================================

    /// Records one partial payment.
    pub fn add_payment(&mut self, method: &str, amount: Money) -> CoreResult<()> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        validation::validate_payment_method(method)?;
        validation::validate_payment_amount(amount)?;

        self.payments.push(PendingPayment {
            method: method.trim().to_string(),
            amount,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Takes back the most recent payment.
    pub fn pop_payment(&mut self) -> Option<PendingPayment> {
        self.payments.pop()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Clears payments and notes. Lines stay.
    pub fn clear_payments(&mut self) {
        self.payments.clear();
        self.notes.clear();
    }

    /// Clears everything.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.payments.clear();
        self.notes.clear();
        self.created_at = Utc::now();
    }

    fn drop_orphaned_payments(&mut self) {
        if self.lines.is_empty() {
            self.payments.clear();
        }
    }

    // =========================================================================
    // Archive
    // =========================================================================

    /// Frozen copy of the working set under a new archive id.
    pub fn snapshot(&self, name: impl Into<String>) -> CoreResult<SavedCart> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cart name".to_string(),
            }
            .into());
        }
        Ok(SavedCart {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            saved_at: Utc::now(),
            lines: self.lines.clone(),
            payments: self.payments.clone(),
            notes: self.notes.clone(),
        })
    }

    /// Replaces the working set with a saved snapshot, order preserved.
    pub fn restore(&mut self, saved: &SavedCart) {
        self.lines = saved.lines.clone();
        self.payments = saved.payments.clone();
        self.notes = saved.notes.clone();
        self.created_at = Utc::now();
    }

    /// Read model handed to the presentation layer.
    pub fn summary(&self, rate: TaxRate) -> CartSummary {
        let totals = self.totals(rate);
        let amount_paid = self.amount_paid();
        CartSummary {
            lines: self.lines.clone(),
            payments: self.payments.clone(),
            notes: self.notes.clone(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            amount_paid,
            remaining_due: totals.total - amount_paid,
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart contents plus every derived amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub payments: Vec<PendingPayment>,
    pub notes: String,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub remaining_due: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, Unit};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn stock(id: &str, price_cents: i64, quantity: Decimal) -> StockItem {
        StockItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            barcode: format!("759{}", id),
            buying_price: Money::from_cents(price_cents / 2),
            selling_price: Money::from_cents(price_cents),
            quantity,
            unit: Unit::Item,
            includes_tax: false,
            discount: Discount::NONE,
            currency: "BS".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_reservation_rule() {
        let mut cart = Cart::new();
        let item = stock("1", 100, dec!(5));

        cart.add_line(&item, dec!(3)).unwrap();
        let err = cart.add_line(&item, dec!(3)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart.reserved_quantity("1"), dec!(3));

        cart.add_line(&item, dec!(2)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.reserved_quantity("1"), dec!(5));
    }

    #[test]
    fn test_add_non_positive_quantity_fails() {
        let mut cart = Cart::new();
        let item = stock("1", 100, dec!(5));
        assert!(matches!(
            cart.add_line(&item, dec!(0)),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_fractional_discrete_quantity_fails() {
        let mut cart = Cart::new();
        let item = stock("1", 100, dec!(5));
        assert!(matches!(
            cart.add_line(&item, dec!(1.5)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_weighed_item_accepts_fractions() {
        let mut cart = Cart::new();
        let mut rice = stock("2", 120, dec!(30));
        rice.unit = Unit::Weight;

        cart.add_line(&rice, dec!(2.5)).unwrap();
        assert_eq!(cart.totals(TaxRate::default()).subtotal.cents(), 300);
    }

    #[test]
    fn test_set_line_quantity() {
        let mut cart = Cart::new();
        let mut item = stock("1", 100, dec!(5));
        cart.add_line(&item, dec!(2)).unwrap();

        cart.set_line_quantity("1", dec!(4), &item).unwrap();
        assert_eq!(cart.reserved_quantity("1"), dec!(4));

        // Live stock dropped since the line was added.
        item.quantity = dec!(3);
        let err = cart.set_line_quantity("1", dec!(4), &item).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart.reserved_quantity("1"), dec!(4));

        cart.set_line_quantity("1", dec!(0), &item).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.set_line_quantity("1", dec!(1), &item),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_line_always_succeeds() {
        let mut cart = Cart::new();
        cart.remove_line("missing");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_toggle_discount() {
        let mut cart = Cart::new();
        let mut item = stock("1", 2000, dec!(5));
        item.discount = Discount::from_bps(1000);
        cart.add_line(&item, dec!(1)).unwrap();

        assert_eq!(cart.totals(TaxRate::default()).subtotal.cents(), 2000);
        cart.toggle_line_discount("1", true).unwrap();
        assert_eq!(cart.totals(TaxRate::default()).subtotal.cents(), 1800);
        assert!(cart.toggle_line_discount("nope", true).is_err());
    }

    #[test]
    fn test_snapshot_freezes_price() {
        let mut cart = Cart::new();
        let mut item = stock("1", 1000, dec!(5));
        cart.add_line(&item, dec!(1)).unwrap();

        item.selling_price = Money::from_cents(5000);
        cart.add_line(&item, dec!(1)).unwrap();

        assert_eq!(cart.totals(TaxRate::default()).subtotal.cents(), 2000);
    }

    #[test]
    fn test_payments_require_lines_and_positive_amount() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_payment("Efectivo", Money::from_cents(100)),
            Err(CoreError::EmptyCart)
        ));

        cart.add_line(&stock("1", 1000, dec!(5)), dec!(1)).unwrap();
        assert!(cart.add_payment("Efectivo", Money::zero()).is_err());
        assert!(cart.add_payment("", Money::from_cents(100)).is_err());

        cart.add_payment("Efectivo", Money::from_cents(400)).unwrap();
        assert_eq!(cart.amount_paid().cents(), 400);
        assert_eq!(cart.remaining_due(TaxRate::default()).cents(), 600);
    }

    #[test]
    fn test_remaining_due_goes_negative_on_overpayment() {
        let mut cart = Cart::new();
        cart.add_line(&stock("1", 1000, dec!(5)), dec!(1)).unwrap();
        cart.add_payment("Efectivo", Money::from_cents(1500)).unwrap();
        assert_eq!(cart.remaining_due(TaxRate::default()).cents(), -500);
    }

    #[test]
    fn test_clear_payments_keeps_lines() {
        let mut cart = Cart::new();
        cart.add_line(&stock("1", 1000, dec!(5)), dec!(1)).unwrap();
        cart.add_payment("Zelle", Money::from_cents(100)).unwrap();
        cart.set_notes("cliente frecuente");

        cart.clear_payments();

        assert_eq!(cart.lines().len(), 1);
        assert!(cart.payments().is_empty());
        assert!(cart.notes().is_empty());
    }

    #[test]
    fn test_removing_last_line_drops_payments() {
        let mut cart = Cart::new();
        cart.add_line(&stock("1", 1000, dec!(5)), dec!(1)).unwrap();
        cart.add_payment("Zelle", Money::from_cents(100)).unwrap();

        cart.remove_line("1");
        assert!(cart.payments().is_empty());
    }

    #[test]
    fn test_filter_matches_name_or_barcode() {
        let mut cart = Cart::new();
        cart.add_line(&stock("1", 100, dec!(5)), dec!(1)).unwrap();
        cart.add_line(&stock("2", 100, dec!(5)), dec!(1)).unwrap();

        assert_eq!(cart.filter("item 2").len(), 1);
        assert_eq!(cart.filter("7591").len(), 1);
        assert_eq!(cart.filter("").len(), 2);
    }

    #[test]
    fn test_snapshot_and_restore_preserve_order() {
        let mut cart = Cart::new();
        cart.add_line(&stock("b", 100, dec!(5)), dec!(1)).unwrap();
        cart.add_line(&stock("a", 100, dec!(5)), dec!(2)).unwrap();
        cart.add_payment("Efectivo", Money::from_cents(50)).unwrap();
        cart.set_notes("apartado");

        let saved = cart.snapshot("Ticket 1").unwrap();
        cart.clear();
        cart.restore(&saved);

        let ids: Vec<_> = cart.lines().iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(cart.payments(), saved.payments.as_slice());
        assert_eq!(cart.notes(), "apartado");
    }

    #[test]
    fn test_snapshot_rejects_empty_cart() {
        assert!(matches!(
            Cart::new().snapshot("Ticket 1"),
            Err(CoreError::EmptyCart)
        ));
    }

    proptest! {
        #[test]
        fn reservations_never_exceed_stock(
            on_hand in 0i64..50,
            adds in proptest::collection::vec(-5i64..15, 1..20),
        ) {
            let item = stock("p", 100, Decimal::from(on_hand));
            let mut cart = Cart::new();

            for qty in adds {
                let _ = cart.add_line(&item, Decimal::from(qty));
                prop_assert!(cart.reserved_quantity("p") <= item.quantity);
                prop_assert!(cart.lines().iter().all(|l| l.requested_quantity > Decimal::ZERO));
            }
        }
    }
}
