//! # Settings Repository
//!
//! Key/value store for register-wide settings.
//!
//! ## Keys
//! ```text
//! rates             JSON ExchangeRates {"base":"BS","rates":{"USD":"36.5"}}
//! display_currency  code used when formatting amounts ("BS" by default)
//! store_name        free text shown on receipts
//! ```

use bodega_core::ExchangeRates;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DbResult;

const RATES_KEY: &str = "rates";
const DISPLAY_CURRENCY_KEY: &str = "display_currency";

/// Repository for the settings table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Inserts or replaces a value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, "Setting stored");
        Ok(())
    }

    // =========================================================================
    // Exchange Rates
    // =========================================================================

    /// The stored rate table on `base`, or an empty one when none is stored.
    ///
    /// ## Base Mismatch
    /// ```text
    /// stored BS {USD: 36.5}, base USD  →  rebased {BS: 0.0273..}, saved back
    /// stored BS {USD: 36.5}, base COP  →  no pivot rate, empty COP table
    /// ```
    pub async fn load_rates(&self, base: &str) -> DbResult<ExchangeRates> {
        let base = base.trim().to_uppercase();
        let Some(raw) = self.get(RATES_KEY).await? else {
            return Ok(ExchangeRates::new(base));
        };

        let stored: ExchangeRates = serde_json::from_str(&raw)?;
        if stored.base.eq_ignore_ascii_case(&base) {
            return Ok(stored);
        }

        match stored.rebased(&base) {
            Ok(rebased) => {
                info!(from = %stored.base, to = %base, "Rebasing stored exchange rates");
                self.save_rates(&rebased).await?;
                Ok(rebased)
            }
            Err(e) => {
                warn!(
                    stored = %stored.base,
                    configured = %base,
                    error = %e,
                    "Stored rates cannot be expressed in the base currency; starting empty"
                );
                Ok(ExchangeRates::new(base))
            }
        }
    }

    /// Validates every rate, then replaces the stored table.
    pub async fn save_rates(&self, rates: &ExchangeRates) -> DbResult<()> {
        rates.validate()?;
        self.set(RATES_KEY, &serde_json::to_string(rates)?).await?;
        info!(base = %rates.base, currencies = rates.rates.len(), "Exchange rates saved");
        Ok(())
    }

    // =========================================================================
    // Display Currency
    // =========================================================================

    /// The currency amounts are shown in; the table's base when unset or
    /// when the stored code no longer has a rate.
    pub async fn display_currency(&self, rates: &ExchangeRates) -> DbResult<String> {
        Ok(self
            .get(DISPLAY_CURRENCY_KEY)
            .await?
            .filter(|code| rates.rate(code).is_ok())
            .unwrap_or_else(|| rates.base.clone()))
    }

    /// Switches the display currency. The code must be the base or have a rate.
    pub async fn set_display_currency(&self, code: &str, rates: &ExchangeRates) -> DbResult<String> {
        let code = code.trim().to_uppercase();
        rates.rate(&code)?;
        self.set(DISPLAY_CURRENCY_KEY, &code).await?;
        info!(currency = %code, "Display currency changed");
        Ok(code)
    }
}
