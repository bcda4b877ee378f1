//! # Bodega Register
//!
//! The command layer of the register. Owns the live state handles and
//! exposes one async function per ledger operation; everything with rules
//! lives in `bodega-core`, everything durable in `bodega-db`.
//!
//! ## Module Organization
//! ```text
//! bodega_register/
//! ├── lib.rs          ◄─── You are here (startup, tracing, Register bundle)
//! ├── state/
//! │   ├── db.rs       ◄─── Database handle
//! │   ├── cart.rs     ◄─── Live cart behind a tokio Mutex
//! │   ├── config.rs   ◄─── TOML + environment configuration
//! │   └── session.rs  ◄─── Operator roster and selection
//! ├── commands/       ◄─── inventory, cart, checkout, history, saved_carts,
//! │                        rates, reports, session, config
//! └── error.rs        ◄─── ApiError { code, message }
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG or "info,bodega=debug,sqlx=warn"  │
//! │  2. ConfigState::load()     defaults ◄ bodega.toml ◄ BODEGA_* env      │
//! │  3. Register::open()                                                    │
//! │     • resolve database path (platform data dir unless configured)      │
//! │     • connect on the configured base currency, WAL, run migrations     │
//! │     • seed starter items and rates into an empty database              │
//! │     • empty cart, default operator roster                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use bodega_db::{seed_defaults, Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{CartState, ConfigState, DbState, SessionState};

/// Every state handle a command may ask for.
#[derive(Debug, Clone)]
pub struct Register {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
    pub session: SessionState,
}

impl Register {
    /// Opens the configured database and builds fresh session state.
    pub async fn open(config: ConfigState) -> Result<Self, ApiError> {
        let db_path = config.resolve_database_path()?;
        info!(?db_path, "Database path determined");

        let db_config = DbConfig::new(db_path).base_currency(&config.base_currency);
        let db = Database::new(db_config).await?;
        info!("Database connected and migrations applied");

        Self::with_database(db, config).await
    }

    /// Builds the register around an already open database.
    ///
    /// The database must have been opened on the configured base currency.
    pub async fn with_database(db: Database, config: ConfigState) -> Result<Self, ApiError> {
        if !db.base_currency().eq_ignore_ascii_case(&config.base_currency) {
            return Err(ApiError::validation(format!(
                "database opened on base currency {} but the register is configured for {}",
                db.base_currency(),
                config.base_currency
            )));
        }

        if config.seed_on_first_run {
            let report = seed_defaults(&db, "system").await?;
            if report.items_created > 0 || report.rates_created {
                info!(
                    items = report.items_created,
                    rates = report.rates_created,
                    "Seeded starter data"
                );
            }
        }

        Ok(Register {
            db: DbState::new(db),
            cart: CartState::new(),
            config,
            session: SessionState::default(),
        })
    }
}

/// Installs the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Everything at debug
/// - `RUST_LOG=bodega_db=trace` - One crate only
/// - Default: info, debug for bodega crates, warn for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bodega=debug,sqlx=warn"));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
