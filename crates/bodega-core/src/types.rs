//! # Domain Types
//!
//! Core domain types used throughout the Bodega ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │    CartLine     │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  item snapshot  │──►│  frozen totals  │       │
//! │  │  quantity (dec) │   │  requested qty  │   │  lines + returns│       │
//! │  │  history[]      │   │  apply_discount │   │  payments       │       │
//! │  └─────────────────┘   └─────────────────┘   │  images         │       │
//! │          │                                    └─────────────────┘       │
//! │          ▼                                                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  AuditRecord    │   │ PendingPayment  │   │  ExchangeRates  │       │
//! │  │  action, user   │   │  method label   │   │  code → rate    │       │
//! │  │  prev/new qty   │   │  amount > 0     │   │  rate > 0       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities are `Decimal` so weighed and measured stock (kilograms,
//! liters) share one code path with discrete items. Money is always
//! integer minor units of the base currency.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing;

/// Decimal places kept when a rate is derived by division.
const RATE_SCALE: u32 = 10;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1000 bps = 10%, the default applied to lines flagged `includes_tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact percentage.
    pub fn percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A per-item percentage discount, stored in basis points.
///
/// Always within [0, 10000] bps. Out-of-range input is clamped when the
/// value is built, so downstream pricing never sees a negative price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount(u32);

impl Discount {
    /// Full price.
    pub const NONE: Discount = Discount(0);

    /// Creates a discount from basis points, clamped to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > 10_000 {
            Discount(10_000)
        } else {
            Discount(bps)
        }
    }

    /// Creates a discount from a percentage, clamped to [0, 100].
    ///
    /// ```rust
    /// use bodega_core::types::Discount;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Discount::from_percent(Decimal::new(5, 0)).bps(), 500);
    /// assert_eq!(Discount::from_percent(Decimal::new(150, 0)).bps(), 10_000);
    /// assert_eq!(Discount::from_percent(Decimal::new(-3, 0)).bps(), 0);
    /// ```
    pub fn from_percent(percent: Decimal) -> Self {
        let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let bps = (clamped * Decimal::ONE_HUNDRED).round();
        Discount(bps.to_u32().unwrap_or(0))
    }

    /// Returns the discount in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the discount as an exact percentage.
    pub fn percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit of Measure
// =============================================================================

/// How a stock item is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Discrete units; quantities must be whole numbers.
    #[default]
    Item,
    /// Sold by weight (kilograms); fractional quantities allowed.
    Weight,
    /// Sold by volume (liters); fractional quantities allowed.
    Volume,
}

impl Unit {
    /// Whether a quantity like 1.5 is meaningful for this unit.
    pub const fn allows_fraction(&self) -> bool {
        !matches!(self, Unit::Item)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Item => write!(f, "item"),
            Unit::Weight => write!(f, "weight"),
            Unit::Volume => write!(f, "volume"),
        }
    }
}

// =============================================================================
// Audit Trail
// =============================================================================

/// What happened to a stock item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Sale,
    Return,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Sale => "sale",
            AuditAction::Return => "return",
            AuditAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Stock movements driven by the sale and return flows.
///
/// Only these two reasons may call `adjust_quantity`; edits go through
/// `update` and carry their own audit semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockMovement {
    Sale,
    Return,
}

impl StockMovement {
    /// The audit action recorded for this movement.
    pub const fn action(&self) -> AuditAction {
        match self {
            StockMovement::Sale => AuditAction::Sale,
            StockMovement::Return => AuditAction::Return,
        }
    }
}

/// Before/after quantities of a stock change.
///
/// Bundled in one struct so an audit record either has both values or
/// neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuantityChange {
    #[ts(as = "String")]
    pub previous: Decimal,
    #[ts(as = "String")]
    pub new: Decimal,
}

impl QuantityChange {
    /// Signed difference `new - previous`.
    pub fn delta(&self) -> Decimal {
        self.new - self.previous
    }
}

/// One immutable entry in a stock item's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditRecord {
    pub id: String,
    pub item_id: String,
    pub action: AuditAction,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub user_id: String,
    pub quantity_change: Option<QuantityChange>,
}

// =============================================================================
// Stock Item
// =============================================================================

/// An inventory entry: the authoritative quantity on hand plus its history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the operator and on receipts.
    pub name: String,

    /// Search key. Not required to be unique.
    pub barcode: String,

    /// Acquisition cost in the base currency.
    pub buying_price: Money,

    /// Shelf price in the base currency.
    pub selling_price: Money,

    /// Quantity on hand. Never negative.
    #[ts(as = "String")]
    pub quantity: Decimal,

    pub unit: Unit,

    /// Whether the configured tax rate applies on top of the price.
    pub includes_tax: bool,

    pub discount: Discount,

    /// Base currency marker the prices are expressed in.
    pub currency: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,

    /// Ordered oldest first.
    pub history: Vec<AuditRecord>,
}

impl StockItem {
    /// Selling price after the item's discount, when it is applied.
    pub fn effective_price(&self, apply_discount: bool) -> Money {
        pricing::apply_line_adjustments(self.selling_price, self.discount, apply_discount)
    }

    /// Whether nothing is left to sell.
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }
}

/// Fields supplied when creating or editing a stock item.
///
/// Prices are optional here so that a missing price is reported as a
/// validation error instead of silently defaulting to zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockItemInput {
    pub name: String,
    pub barcode: String,
    pub buying_price: Option<Money>,
    pub selling_price: Option<Money>,
    #[ts(as = "String")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub includes_tax: bool,
    /// Percentage in [0, 100]; clamped when applied.
    #[serde(default)]
    #[ts(as = "String")]
    pub discount_percent: Decimal,
    /// When set, the write is rejected unless the stored version matches.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

// =============================================================================
// Search
// =============================================================================

/// Which field an inventory search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    All,
    Name,
    Barcode,
}

// =============================================================================
// Delete Policy
// =============================================================================

/// What `delete` does to a stock item and its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Remove the item together with its history.
    #[default]
    Purge,
    /// Hide the item from lookups, keep its history, record a `delete` entry.
    Tombstone,
}

impl FromStr for DeletePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purge" => Ok(DeletePolicy::Purge),
            "tombstone" => Ok(DeletePolicy::Tombstone),
            other => Err(ValidationError::InvalidFormat {
                field: "delete_policy".to_string(),
                reason: format!("unknown policy '{}', expected purge or tombstone", other),
            }),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A point-in-time copy of a stock item inside the open cart.
///
/// Price, discount, and tax flag are frozen when the line is created.
/// Availability is always re-checked against the live item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Stock item this line reserves from. One line per item.
    pub item_id: String,
    pub name: String,
    pub barcode: String,
    pub unit: Unit,
    pub unit_price: Money,
    pub discount: Discount,
    pub includes_tax: bool,
    #[ts(as = "String")]
    pub requested_quantity: Decimal,
    /// Independent of whether `discount` is nonzero.
    pub apply_discount: bool,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Snapshots a stock item with the given quantity.
    pub fn from_item(item: &StockItem, quantity: Decimal) -> Self {
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            barcode: item.barcode.clone(),
            unit: item.unit,
            unit_price: item.selling_price,
            discount: item.discount,
            includes_tax: item.includes_tax,
            requested_quantity: quantity,
            apply_discount: false,
            added_at: Utc::now(),
        }
    }

    /// Unit price after the line's discount toggle.
    pub fn effective_price(&self) -> Money {
        pricing::apply_line_adjustments(self.unit_price, self.discount, self.apply_discount)
    }

    /// Effective price × requested quantity.
    pub fn line_total(&self) -> Money {
        self.effective_price().times(self.requested_quantity)
    }

    /// Tax owed on this line at the given rate.
    pub fn line_tax(&self, rate: TaxRate) -> Money {
        pricing::line_tax(
            self.effective_price(),
            self.requested_quantity,
            self.includes_tax,
            rate,
        )
    }
}

// =============================================================================
// Payments
// =============================================================================

/// One partial payment toward the open sale, in the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PendingPayment {
    /// Free-text label ("Efectivo", "Punto de venta", "Zelle", ...).
    pub method: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Saved Cart
// =============================================================================

/// A named, frozen copy of a cart's working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SavedCart {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub saved_at: DateTime<Utc>,
    pub lines: Vec<CartLine>,
    pub payments: Vec<PendingPayment>,
    pub notes: String,
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed cart line with its return counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    pub name: String,
    pub barcode: String,
    pub unit: Unit,
    pub unit_price: Money,
    pub discount: Discount,
    pub apply_discount: bool,
    pub includes_tax: bool,
    /// Quantity sold.
    #[ts(as = "String")]
    pub quantity: Decimal,
    #[ts(as = "String")]
    pub quantity_returned: Decimal,
    /// Effective price × quantity, frozen at commit.
    pub line_total: Money,
}

impl TransactionLine {
    /// Builds the ledger line for a cart line being committed.
    pub fn from_cart_line(transaction_id: &str, line: &CartLine) -> Self {
        TransactionLine {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            barcode: line.barcode.clone(),
            unit: line.unit,
            unit_price: line.unit_price,
            discount: line.discount,
            apply_discount: line.apply_discount,
            includes_tax: line.includes_tax,
            quantity: line.requested_quantity,
            quantity_returned: Decimal::ZERO,
            line_total: line.line_total(),
        }
    }

    /// Quantity that may still be returned.
    pub fn returnable(&self) -> Decimal {
        self.quantity - self.quantity_returned
    }
}

/// A committed sale. Totals are frozen at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub lines: Vec<TransactionLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payments: Vec<PendingPayment>,
    pub notes: String,
    /// Encoded receipt images or URIs, append-only.
    pub images: Vec<String>,
}

impl Transaction {
    /// Sum of all recorded payments.
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Change handed back at commit (zero when paid exactly).
    pub fn change_given(&self) -> Money {
        let over = self.amount_paid() - self.total;
        if over.is_positive() {
            over
        } else {
            Money::zero()
        }
    }

    /// Finds the line that sold the given stock item.
    pub fn line_for_item(&self, item_id: &str) -> Option<&TransactionLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }
}

// =============================================================================
// Exchange Rates
// =============================================================================

/// Operator-entered rates: base-currency units per one unit of each
/// secondary currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRates {
    pub base: String,
    #[ts(type = "Record<string, string>")]
    pub rates: BTreeMap<String, Decimal>,
}

impl ExchangeRates {
    /// An empty table on the given base currency.
    pub fn new(base: impl Into<String>) -> Self {
        ExchangeRates {
            base: base.into(),
            rates: BTreeMap::new(),
        }
    }

    /// Looks up the rate for a secondary currency.
    ///
    /// The base currency itself has an implicit rate of 1.
    pub fn rate(&self, currency: &str) -> CoreResult<Decimal> {
        if currency.eq_ignore_ascii_case(&self.base) {
            return Ok(Decimal::ONE);
        }
        let rate = self
            .rates
            .get(&currency.to_uppercase())
            .copied()
            .ok_or_else(|| CoreError::invalid_rate(currency, "no rate configured"))?;
        if rate <= Decimal::ZERO {
            return Err(CoreError::invalid_rate(
                currency,
                format!("rate must be positive, got {}", rate),
            ));
        }
        Ok(rate)
    }

    /// Sets or replaces a rate. Rejects rates ≤ 0 and the base currency.
    pub fn set(&mut self, currency: &str, rate: Decimal) -> CoreResult<()> {
        let code = currency.trim().to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            }
            .into());
        }
        if code == self.base.to_uppercase() {
            return Err(CoreError::invalid_rate(
                code,
                "the base currency always converts at 1",
            ));
        }
        if rate <= Decimal::ZERO {
            return Err(CoreError::invalid_rate(
                code,
                format!("rate must be positive, got {}", rate),
            ));
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    /// Re-expresses the table on another base currency.
    ///
    /// The new base must already have a rate here. The old base becomes an
    /// ordinary entry at `1 / rate(new_base)`.
    ///
    /// ```text
    /// base BS { USD: 36.5, EUR: 39.2 }  ──rebased("USD")──►  base USD { BS: 0.0273.., EUR: 1.0739.. }
    /// ```
    pub fn rebased(&self, new_base: &str) -> CoreResult<ExchangeRates> {
        let new_base = new_base.trim().to_uppercase();
        if self.base.eq_ignore_ascii_case(&new_base) {
            return Ok(self.clone());
        }
        let pivot = self.rate(&new_base)?;

        let mut rebased = ExchangeRates::new(new_base.clone());
        rebased.set(&self.base, (Decimal::ONE / pivot).round_dp(RATE_SCALE))?;
        for (code, rate) in &self.rates {
            if *code == new_base {
                continue;
            }
            rebased.set(code, (*rate / pivot).round_dp(RATE_SCALE))?;
        }
        Ok(rebased)
    }

    /// Checks that every stored rate is positive.
    pub fn validate(&self) -> CoreResult<()> {
        for (code, rate) in &self.rates {
            if *rate <= Decimal::ZERO {
                return Err(CoreError::invalid_rate(
                    code.clone(),
                    format!("rate must be positive, got {}", rate),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Operator role. Elevated operators may manage inventory and rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Someone who can be selected as the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Operator {
    pub fn is_elevated(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_rate_default_is_ten_percent() {
        assert_eq!(TaxRate::default().bps(), 1000);
        assert_eq!(TaxRate::default().percent(), dec!(10.00));
    }

    #[test]
    fn test_discount_clamps_from_bps() {
        assert_eq!(Discount::from_bps(12_000).bps(), 10_000);
        assert_eq!(Discount::from_bps(500).percent(), dec!(5.00));
    }

    #[test]
    fn test_unit_fraction_rules() {
        assert!(!Unit::Item.allows_fraction());
        assert!(Unit::Weight.allows_fraction());
        assert!(Unit::Volume.allows_fraction());
    }

    #[test]
    fn test_delete_policy_parse() {
        assert_eq!("purge".parse::<DeletePolicy>().unwrap(), DeletePolicy::Purge);
        assert_eq!(
            " Tombstone ".parse::<DeletePolicy>().unwrap(),
            DeletePolicy::Tombstone
        );
        assert!("archive".parse::<DeletePolicy>().is_err());
    }

    #[test]
    fn test_exchange_rates_lookup() {
        let mut rates = ExchangeRates::new("BS");
        rates.set("usd", dec!(36.5)).unwrap();

        assert_eq!(rates.rate("BS").unwrap(), Decimal::ONE);
        assert_eq!(rates.rate("USD").unwrap(), dec!(36.5));
        assert!(matches!(
            rates.rate("GBP"),
            Err(CoreError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_exchange_rates_reject_non_positive() {
        let mut rates = ExchangeRates::new("BS");
        assert!(rates.set("EUR", dec!(0)).is_err());
        assert!(rates.set("EUR", dec!(-1)).is_err());
        assert!(rates.set("BS", dec!(2)).is_err());
        assert!(rates.rates.is_empty());
    }

    #[test]
    fn test_exchange_rates_json_shape() {
        let mut rates = ExchangeRates::new("BS");
        rates.set("USD", dec!(36.5)).unwrap();

        let json = serde_json::to_string(&rates).unwrap();
        assert_eq!(json, r#"{"base":"BS","rates":{"USD":"36.5"}}"#);

        let back: ExchangeRates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rates);
    }

    #[test]
    fn test_rebase_keeps_base_conversion_exact() {
        let mut rates = ExchangeRates::new("BS");
        rates.set("USD", dec!(36.5)).unwrap();
        rates.set("EUR", dec!(39.2)).unwrap();

        let usd = rates.rebased("usd").unwrap();
        assert_eq!(usd.base, "USD");
        assert_eq!(usd.rate("USD").unwrap(), Decimal::ONE);
        assert!(!usd.rates.contains_key("USD"));
        assert_eq!(usd.rate("EUR").unwrap(), (dec!(39.2) / dec!(36.5)).round_dp(10));
        assert_eq!(usd.rate("BS").unwrap(), (Decimal::ONE / dec!(36.5)).round_dp(10));

        assert_eq!(rates.rebased("BS").unwrap(), rates);
        assert!(matches!(
            rates.rebased("GBP"),
            Err(CoreError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_quantity_change_delta() {
        let change = QuantityChange {
            previous: dec!(50),
            new: dec!(47),
        };
        assert_eq!(change.delta(), dec!(-3));
    }

    #[test]
    fn test_operator_elevation() {
        let admin = Operator {
            id: "1".into(),
            name: "Administrador Principal".into(),
            role: Role::Admin,
        };
        assert!(admin.is_elevated());
    }
}
