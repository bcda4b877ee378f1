//! # Pricing Engine
//!
//! Stateless currency conversion plus discount and tax arithmetic.
//!
//! ## Line Math
//! ```text
//! selling_price ──► apply_line_adjustments(discount, apply?) ──► effective
//!                                                                   │
//!                         effective × quantity ◄────────────────────┤
//!                                 │                                 │
//!                                 ▼                                 ▼
//!                         line total (subtotal)          line_tax(includes_tax)
//! ```
//!
//! Everything here is a pure function of its arguments plus, for
//! conversion, a snapshot of the rate table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{CartLine, Discount, ExchangeRates, TaxRate};

/// Converts a base-currency amount into a display currency.
///
/// The base currency converts at 1. Any other currency divides by its
/// rate ("base units per one unit of that currency").
///
/// ```rust
/// use bodega_core::money::Money;
/// use bodega_core::pricing::convert;
/// use bodega_core::types::ExchangeRates;
/// use rust_decimal::Decimal;
///
/// let mut rates = ExchangeRates::new("BS");
/// rates.set("USD", Decimal::new(365, 1)).unwrap();
///
/// let usd = convert(Money::from_cents(3650), "USD", &rates).unwrap();
/// assert_eq!(usd.cents(), 100);
/// ```
pub fn convert(amount: Money, currency: &str, rates: &ExchangeRates) -> CoreResult<Money> {
    let rate = rates.rate(currency)?;
    if rate == Decimal::ONE {
        return Ok(amount);
    }
    Ok(Money::from_decimal(amount.to_decimal() / rate))
}

/// Selling price after an optional percentage discount.
///
/// Unchanged unless `apply_discount` is set and the discount is nonzero.
pub fn apply_line_adjustments(selling_price: Money, discount: Discount, apply_discount: bool) -> Money {
    if !apply_discount || discount.is_zero() {
        return selling_price;
    }
    selling_price.apply_percentage_discount(discount.bps())
}

/// Tax owed on `effective_price × quantity` when the line is taxable.
pub fn line_tax(effective_price: Money, quantity: Decimal, includes_tax: bool, rate: TaxRate) -> Money {
    if !includes_tax {
        return Money::zero();
    }
    effective_price.times(quantity).calculate_tax(rate)
}

/// Derived totals of a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Sums line totals and line taxes. Never cached; call on every read.
pub fn compute_totals(lines: &[CartLine], rate: TaxRate) -> Totals {
    let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
    let tax: Money = lines.iter().map(|l| l.line_tax(rate)).sum();
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Display symbol for a currency code.
pub fn currency_symbol(code: &str) -> &str {
    match code.to_uppercase().as_str() {
        "BS" | "VES" => "Bs",
        "USD" => "$",
        "EUR" => "€",
        _ => code,
    }
}

/// Converts and renders an amount as `"<symbol> <major>.<minor>"`.
///
/// ```rust
/// use bodega_core::money::Money;
/// use bodega_core::pricing::format_amount;
/// use bodega_core::types::ExchangeRates;
/// use rust_decimal::Decimal;
///
/// let mut rates = ExchangeRates::new("BS");
/// rates.set("EUR", Decimal::new(392, 1)).unwrap();
///
/// assert_eq!(format_amount(Money::from_cents(3920), "EUR", &rates).unwrap(), "€ 1.00");
/// assert_eq!(format_amount(Money::from_cents(3920), "BS", &rates).unwrap(), "Bs 39.20");
/// ```
pub fn format_amount(amount: Money, currency: &str, rates: &ExchangeRates) -> CoreResult<String> {
    let converted = convert(amount, currency, rates)?;
    Ok(format!("{} {}", currency_symbol(currency), converted))
}

// =============================================================================
// Unit Tests
// =============================================================================
