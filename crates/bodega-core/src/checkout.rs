//! # Checkout State Machine
//!
//! Decides what a payment means for the open sale.
//!
//! ```text
//!            add_payment                 remaining_due ≤ 0
//!   Open ───────────────► CollectingPayment ───────────────► Settled ──► commit
//!    ▲                          │
//!    └──────── cancel ──────────┘   (payments + notes cleared, lines kept)
//! ```
//!
//! The state is derived from the cart, never stored, so it cannot drift
//! from the lines and payments it describes. Committing is the caller's
//! job; see `bodega_db::repository::ledger`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::TaxRate;

/// Where the open sale is in the payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// No payments yet.
    Open,
    /// At least one payment, balance still outstanding.
    CollectingPayment,
    /// Paid in full (or over). Ready to commit.
    Settled,
}

/// Result of evaluating the balance after a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// More money is needed.
    Outstanding { remaining: Money },
    /// Paid in full. `change_due` is zero for an exact payment.
    Settled { change_due: Money },
}

impl PaymentOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentOutcome::Settled { .. })
    }
}

/// Compares what was paid against the total.
///
/// ```rust
/// use bodega_core::checkout::{evaluate, PaymentOutcome};
/// use bodega_core::money::Money;
///
/// let outcome = evaluate(Money::from_cents(3980), Money::from_cents(5000));
/// assert_eq!(outcome, PaymentOutcome::Settled { change_due: Money::from_cents(1020) });
/// ```
pub fn evaluate(total: Money, paid: Money) -> PaymentOutcome {
    let remaining = total - paid;
    if remaining.is_positive() {
        PaymentOutcome::Outstanding { remaining }
    } else {
        PaymentOutcome::Settled {
            change_due: -remaining,
        }
    }
}

/// Current phase of a cart.
pub fn phase(cart: &Cart, rate: TaxRate) -> CheckoutPhase {
    if cart.payments().is_empty() {
        return CheckoutPhase::Open;
    }
    if cart.remaining_due(rate).is_positive() {
        CheckoutPhase::CollectingPayment
    } else {
        CheckoutPhase::Settled
    }
}

/// Adds a payment and evaluates the new balance.
///
/// On `Settled` the caller must commit; if that commit fails it should
/// `pop_payment` so the cart returns to its previous balance.
pub fn record_payment(
    cart: &mut Cart,
    method: &str,
    amount: Money,
    rate: TaxRate,
) -> CoreResult<PaymentOutcome> {
    cart.add_payment(method, amount)?;
    Ok(evaluate(cart.totals(rate).total, cart.amount_paid()))
}

/// Returns the sale to `Open`: payments and notes go, lines stay.
pub fn cancel(cart: &mut Cart) {
    cart.clear_payments();
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, StockItem, Unit};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn stock(id: &str, price_cents: i64, discount_bps: u32, taxed: bool) -> StockItem {
        StockItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            barcode: id.to_string(),
            buying_price: Money::zero(),
            selling_price: Money::from_cents(price_cents),
            quantity: dec!(10),
            unit: Unit::Item,
            includes_tax: taxed,
            discount: Discount::from_bps(discount_bps),
            currency: "BS".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
            history: Vec::new(),
        }
    }

    /// 10.00 × 2 untaxed plus 20.00 at 10% off, taxed: total 39.80.
    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(&stock("a", 1000, 0, false), Decimal::from(2)).unwrap();
        cart.add_line(&stock("b", 2000, 1000, true), Decimal::ONE).unwrap();
        cart.toggle_line_discount("b", true).unwrap();
        cart
    }

    #[test]
    fn test_sample_totals() {
        let totals = sample_cart().totals(TaxRate::default());
        assert_eq!(totals.total.cents(), 3980);
    }

    #[test]
    fn test_split_tender_settles_exactly() {
        let mut cart = sample_cart();
        let rate = TaxRate::default();

        let first = record_payment(&mut cart, "Efectivo", Money::from_cents(2500), rate).unwrap();
        assert_eq!(
            first,
            PaymentOutcome::Outstanding {
                remaining: Money::from_cents(1480)
            }
        );
        assert_eq!(phase(&cart, rate), CheckoutPhase::CollectingPayment);

        let second = record_payment(&mut cart, "Punto", Money::from_cents(1480), rate).unwrap();
        assert_eq!(
            second,
            PaymentOutcome::Settled {
                change_due: Money::zero()
            }
        );
        assert_eq!(phase(&cart, rate), CheckoutPhase::Settled);
    }

    #[test]
    fn test_overpayment_reports_change() {
        let mut cart = sample_cart();
        let outcome =
            record_payment(&mut cart, "Efectivo", Money::from_cents(5000), TaxRate::default())
                .unwrap();

        assert_eq!(
            outcome,
            PaymentOutcome::Settled {
                change_due: Money::from_cents(1020)
            }
        );
        assert_eq!(cart.amount_paid().cents(), 5000);
    }

    #[test]
    fn test_cancel_returns_to_open() {
        let mut cart = sample_cart();
        cart.set_notes("mesa 4");
        record_payment(&mut cart, "Efectivo", Money::from_cents(100), TaxRate::default()).unwrap();

        cancel(&mut cart);

        assert_eq!(phase(&cart, TaxRate::default()), CheckoutPhase::Open);
        assert_eq!(cart.lines().len(), 2);
        assert!(cart.notes().is_empty());
    }

    #[test]
    fn test_rejected_payment_leaves_balance() {
        let mut cart = sample_cart();
        assert!(record_payment(&mut cart, "Efectivo", Money::zero(), TaxRate::default()).is_err());
        assert_eq!(phase(&cart, TaxRate::default()), CheckoutPhase::Open);
    }
}
