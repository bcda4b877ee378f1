//! # Bodega Register Entry Point
//!
//! Starts the register with a line-oriented terminal front end.
//!
//! ## Usage
//! ```bash
//! bodega-register                          # platform config and data dirs
//! bodega-register --config ./bodega.toml
//! bodega-register --db ./bodega_dev.db
//! ```
//!
//! Type `help` at the prompt for the command list.

mod shell;

use std::env;
use std::path::PathBuf;

use bodega_register::state::ConfigState;
use bodega_register::{init_tracing, Register};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bodega Register");
                println!();
                println!("Usage: bodega-register [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: bodega.toml in the config dir)");
                println!("  -d, --db <PATH>      Database file (overrides the config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    init_tracing();
    info!("Starting Bodega register");

    let mut config = ConfigState::load(config_path)?;
    if db_path.is_some() {
        config.database_path = db_path;
    }

    let register = Register::open(config).await?;

    println!("{}", register.config.store_name);
    println!("{}", "=".repeat(register.config.store_name.chars().count().max(8)));
    println!(
        "Items: {}   Sales: {}",
        register.db.inner().stock().count().await?,
        register.db.inner().ledger().count().await?
    );
    if let Some(operator) = register.session.current().await {
        println!("Operator: {} ({})", operator.name, operator.id);
    }
    println!("Type `help` for commands.");
    println!();

    shell::run(&register).await;

    register.db.inner().close().await;
    info!("Register closed");
    Ok(())
}
