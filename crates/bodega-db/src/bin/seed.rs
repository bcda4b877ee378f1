//! # Seed Data Loader
//!
//! Loads the starter items and exchange rates into a register database.
//!
//! ## Usage
//! ```bash
//! # Seed ./bodega_dev.db (default)
//! cargo run -p bodega-db --bin seed
//!
//! # Specify database path and acting user
//! cargo run -p bodega-db --bin seed -- --db ./data/bodega.db --user admin
//!
//! # Price everything in dollars
//! cargo run -p bodega-db --bin seed -- --base USD
//! ```
//!
//! ## Seeded Data
//! - Harina P.A.N. (units, taxed)
//! - Arroz Primor (weight, 5% discount)
//! - Aceite Mazeite (volume, taxed)
//! - Rates: USD 36.5, EUR 39.2 on base BS (rebased for another base)
//!
//! Tables that already hold data are left alone.

use std::env;

use bodega_core::{pricing, BASE_CURRENCY};
use bodega_db::{seed_defaults, Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bodega_dev.db");
    let mut user = String::from("admin");
    let mut base = String::from(BASE_CURRENCY);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user = args[i + 1].clone();
                    i += 1;
                }
            }
            "--base" | "-b" => {
                if i + 1 < args.len() {
                    base = args[i + 1].to_uppercase();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bodega Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bodega_dev.db)");
                println!("  -u, --user <ID>    User recorded in the audit history (default: admin)");
                println!("  -b, --base <CODE>  Base currency items are priced in (default: BS)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("🌱 Bodega Seed Data Loader");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("User:     {}", user);
    println!("Base:     {}", base);
    println!();

    let db = Database::new(DbConfig::new(&db_path).base_currency(&base)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let report = seed_defaults(&db, &user).await?;

    if report.items_created == 0 {
        println!("⚠ Inventory already has items, skipped");
    } else {
        println!("✓ Created {} stock items", report.items_created);
    }
    if report.rates_created {
        println!("✓ Stored starter exchange rates");
    } else {
        println!("⚠ Exchange rates already configured, skipped");
    }

    println!();
    println!("Inventory:");
    let rates = db.settings().load_rates(db.base_currency()).await?;
    for item in db.stock().list().await? {
        println!(
            "  {:<20} {:>10}  x {}",
            item.name,
            pricing::format_amount(item.selling_price, db.base_currency(), &rates)?,
            item.quantity.normalize()
        );
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
