//! # Exchange Rate Commands
//!
//! Operator-entered rates and the currency amounts are displayed in.
//! Stored amounts never change currency; conversion happens on display.

use bodega_core::{pricing, ExchangeRates, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionState};

/// Rate table plus the selected display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesView {
    pub rates: ExchangeRates,
    pub display_currency: String,
}

async fn load(db: &DbState, config: &ConfigState) -> Result<ExchangeRates, ApiError> {
    Ok(db.inner().settings().load_rates(&config.base_currency).await?)
}

pub async fn get_rates(db: &DbState, config: &ConfigState) -> Result<RatesView, ApiError> {
    let rates = load(db, config).await?;
    let display_currency = db.inner().settings().display_currency(&rates).await?;
    Ok(RatesView {
        rates,
        display_currency,
    })
}

/// Sets one rate (base units per unit of `currency`). Admins only.
///
/// ## Errors
/// - `INVALID_RATE` for a rate ≤ 0 or the base currency itself
pub async fn set_rate(
    db: &DbState,
    config: &ConfigState,
    session: &SessionState,
    currency: &str,
    rate: Decimal,
) -> Result<ExchangeRates, ApiError> {
    let operator = session.require_elevated().await?;

    let mut rates = load(db, config).await?;
    rates.set(currency, rate)?;
    db.inner().settings().save_rates(&rates).await?;

    info!(currency = %currency, rate = %rate, operator = %operator.id, "Rate updated");
    Ok(rates)
}

/// Switches the display currency; it must be the base or have a rate.
pub async fn set_display_currency(
    db: &DbState,
    config: &ConfigState,
    code: &str,
) -> Result<String, ApiError> {
    let rates = load(db, config).await?;
    Ok(db.inner().settings().set_display_currency(code, &rates).await?)
}

/// Converts a base-currency amount into `currency`.
pub async fn convert_amount(
    db: &DbState,
    config: &ConfigState,
    amount: Money,
    currency: &str,
) -> Result<Money, ApiError> {
    let rates = load(db, config).await?;
    Ok(pricing::convert(amount, currency, &rates)?)
}

/// Renders a base-currency amount in the display currency, e.g. `"$ 1.09"`.
pub async fn format_for_display(
    db: &DbState,
    config: &ConfigState,
    amount: Money,
) -> Result<String, ApiError> {
    let rates = load(db, config).await?;
    let currency = db.inner().settings().display_currency(&rates).await?;
    Ok(pricing::format_amount(amount, &currency, &rates)?)
}
