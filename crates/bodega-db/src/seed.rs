//! # Starter Data
//!
//! A fresh register gets three staple items and a starting rate table so
//! the first sale can be rung up without any setup.
//!
//! Each part is seeded only when its table is still empty; running this
//! twice never duplicates anything.

use bodega_core::{ExchangeRates, Money, StockItemInput, Unit, BASE_CURRENCY};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;

/// (name, barcode, buying cents, selling cents, quantity, unit, taxed, discount %)
type StarterItem = (&'static str, &'static str, i64, i64, i64, Unit, bool, i64);

const STARTER_ITEMS: &[StarterItem] = &[
    ("Harina P.A.N.", "7590001001001", 90, 110, 50, Unit::Item, true, 0),
    ("Arroz Primor", "7590001001002", 85, 120, 30, Unit::Weight, false, 5),
    ("Aceite Mazeite", "7590001001003", 250, 350, 15, Unit::Volume, true, 0),
];

/// Starting rates in bolívares: USD 36.5, EUR 39.2. Rebased when the
/// register runs on another base currency.
const STARTER_RATES: &[(&str, i64, u32)] = &[("USD", 365, 1), ("EUR", 392, 1)];

/// What `seed_defaults` wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub items_created: usize,
    pub rates_created: bool,
}

/// Seeds starter items and rates into an empty database.
pub async fn seed_defaults(db: &Database, user_id: &str) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();

    if db.stock().count().await? == 0 {
        for &(name, barcode, buying, selling, quantity, unit, taxed, discount) in STARTER_ITEMS {
            let input = StockItemInput {
                name: name.to_string(),
                barcode: barcode.to_string(),
                buying_price: Some(Money::from_cents(buying)),
                selling_price: Some(Money::from_cents(selling)),
                quantity: Decimal::from(quantity),
                unit,
                includes_tax: taxed,
                discount_percent: Decimal::from(discount),
                expected_version: None,
            };
            db.stock().create(&input, user_id).await?;
            report.items_created += 1;
        }
    }

    if db.settings().get("rates").await?.is_none() {
        let mut starter = ExchangeRates::new(BASE_CURRENCY);
        for &(code, mantissa, scale) in STARTER_RATES {
            starter.set(code, Decimal::new(mantissa, scale))?;
        }
        let rates = starter
            .rebased(db.base_currency())
            .unwrap_or_else(|_| ExchangeRates::new(db.base_currency()));
        db.settings().save_rates(&rates).await?;
        report.rates_created = true;
    }

    info!(
        items = report.items_created,
        rates = report.rates_created,
        "Starter data seeded"
    );
    Ok(report)
}
