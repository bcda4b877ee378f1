//! # Configuration State
//!
//! Register configuration loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BODEGA_TAX_RATE=12        BODEGA_DELETE_POLICY=tombstone           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $BODEGA_CONFIG, or bodega.toml in the platform config dir          │
//! │     ~/.config/bodega/bodega.toml (Linux)                               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10% tax, 1 MiB images, purge on delete, base currency BS           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Bodega La Esquina"
//! base_currency = "BS"
//! tax_rate_bps = 1000
//! max_image_bytes = 1048576
//! delete_policy = "purge"    # purge | tombstone
//! database_path = "/var/lib/bodega/bodega.db"
//! seed_on_first_run = true
//! ```
//!
//! Read-only after load, so no lock.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bodega_core::{DeletePolicy, TaxRate, BASE_CURRENCY, DEFAULT_TAX_RATE_BPS, MAX_IMAGE_BYTES};
use directories::ProjectDirs;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration load failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

/// Register configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Shown on receipts.
    pub store_name: String,

    /// Currency of every stored price and total.
    pub base_currency: String,

    /// Tax applied to lines flagged `includes_tax`, in basis points.
    pub tax_rate_bps: u32,

    /// Ceiling for one transaction image, in bytes.
    pub max_image_bytes: usize,

    /// What deleting a stock item does to its history.
    pub delete_policy: DeletePolicy,

    /// SQLite file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Load starter items and rates into an empty database.
    pub seed_on_first_run: bool,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Bodega".to_string(),
            base_currency: BASE_CURRENCY.to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            max_image_bytes: MAX_IMAGE_BYTES,
            delete_policy: DeletePolicy::Purge,
            database_path: None,
            seed_on_first_run: true,
        }
    }
}

impl ConfigState {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$BODEGA_CONFIG`, or the platform default)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("BODEGA_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        info!(
            store = %config.store_name,
            tax_bps = config.tax_rate_bps,
            delete_policy = ?config.delete_policy,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_currency.trim().is_empty() {
            return Err(ConfigError::Invalid("base_currency must not be empty".into()));
        }
        if self.tax_rate_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "tax_rate_bps must be at most 10000, got {}",
                self.tax_rate_bps
            )));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_image_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `BODEGA_*` overrides from any lookup. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("BODEGA_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(code) = lookup("BODEGA_BASE_CURRENCY") {
            self.base_currency = code.trim().to_uppercase();
        }

        // Percent, e.g. "8.25"
        if let Some(raw) = lookup("BODEGA_TAX_RATE") {
            match Decimal::from_str(raw.trim())
                .ok()
                .and_then(|pct| (pct * Decimal::ONE_HUNDRED).round().to_u32())
            {
                Some(bps) => {
                    debug!(bps, "Overriding tax rate from environment");
                    self.tax_rate_bps = bps;
                }
                None => warn!(value = %raw, "Ignoring unparseable BODEGA_TAX_RATE"),
            }
        }

        if let Some(raw) = lookup("BODEGA_MAX_IMAGE_BYTES") {
            match raw.trim().parse::<usize>() {
                Ok(bytes) => self.max_image_bytes = bytes,
                Err(_) => warn!(value = %raw, "Ignoring unparseable BODEGA_MAX_IMAGE_BYTES"),
            }
        }

        if let Some(raw) = lookup("BODEGA_DELETE_POLICY") {
            match raw.parse::<DeletePolicy>() {
                Ok(policy) => self.delete_policy = policy,
                Err(e) => warn!("Ignoring BODEGA_DELETE_POLICY: {}", e),
            }
        }

        if let Some(path) = lookup("BODEGA_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup("BODEGA_SEED") {
            self.seed_on_first_run = matches!(raw.trim(), "1" | "true" | "yes");
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "bodega", "bodega")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("bodega.toml"))
    }

    /// The configured database file, or `bodega.db` in the platform data
    /// directory (created if missing).
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            ensure_parent(path)?;
            return Ok(path.clone());
        }
        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("bodega.db"))
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConfigState::default();
        assert_eq!(config.tax_rate().bps(), 1000);
        assert_eq!(config.max_image_bytes, 1024 * 1024);
        assert_eq!(config.delete_policy, DeletePolicy::Purge);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigState::from_toml_str(
            r#"
            store_name = "Bodega La Esquina"
            delete_policy = "tombstone"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Bodega La Esquina");
        assert_eq!(config.delete_policy, DeletePolicy::Tombstone);
        assert_eq!(config.tax_rate_bps, 1000);
        assert_eq!(config.base_currency, "BS");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BODEGA_TAX_RATE", "8.25"),
            ("BODEGA_DELETE_POLICY", "Tombstone"),
            ("BODEGA_MAX_IMAGE_BYTES", "2048"),
            ("BODEGA_BASE_CURRENCY", "usd"),
        ]
        .into_iter()
        .collect();

        let mut config = ConfigState::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tax_rate_bps, 825);
        assert_eq!(config.delete_policy, DeletePolicy::Tombstone);
        assert_eq!(config.max_image_bytes, 2048);
        assert_eq!(config.base_currency, "USD");
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = ConfigState::default();
        config.apply_overrides(|key| (key == "BODEGA_TAX_RATE").then(|| "diez".to_string()));
        assert_eq!(config.tax_rate_bps, 1000);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = ConfigState::default();
        config.tax_rate_bps = 12_000;
        assert!(config.validate().is_err());

        let mut config = ConfigState::default();
        config.max_image_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodega.toml");
        std::fs::write(&path, "tax_rate_bps = 1600\n").unwrap();

        let config = ConfigState::load(Some(path)).unwrap();
        assert_eq!(config.tax_rate().bps(), 1600);
    }
}
