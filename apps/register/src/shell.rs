//! Line-oriented front end over the register commands.
//!
//! One command per line; every command maps onto exactly one function in
//! `bodega_register::commands`. Errors are printed, never fatal.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use bodega_core::{CartSummary, Money, PaymentOutcome, SearchField, Transaction};
use bodega_register::commands::{
    cart, checkout, history, inventory, rates, reports, saved_carts, session,
};
use bodega_register::error::ApiError;
use bodega_register::Register;
use rust_decimal::Decimal;

const HELP: &str = "\
Inventory   items | search <text> | history <item-id>
Cart        scan <barcode> [qty] | add <item-id> [qty] | qty <item-id> <qty>
            rm <item-id> | discount <item-id> on|off | note <text> | cart
            discard
Checkout    pay <amount> [method] | cancel
Archive     save [name] | carts | load <id> | drop <id>
Ledger      sales [text] | return <tx-id> <item-id> <qty> | report
Rates       rates | rate <currency> <value> | show <currency>
Operators   users | user <id>
            quit";

pub async fn run(register: &Register) {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };
        if matches!(command, "quit" | "exit") {
            break;
        }

        if let Err(e) = dispatch(register, command, rest).await {
            println!("error: {}", e.message);
        }
    }
}

async fn dispatch(r: &Register, command: &str, args: &[&str]) -> Result<(), ApiError> {
    match command {
        "help" => println!("{HELP}"),

        "items" => {
            for item in inventory::list_items(&r.db).await? {
                println!(
                    "{}  {:<24} {:>14}  {:>8} {}",
                    item.id, item.name, item.barcode, item.quantity, item.unit
                );
            }
        }
        "search" => {
            let query = args.join(" ");
            for item in inventory::search_items(&r.db, &query, SearchField::All, None).await? {
                println!("{}  {:<24} {:>8}  {}", item.id, item.name, item.quantity, item.selling_price);
            }
        }
        "history" => {
            let id = arg(args, 0, "item id")?;
            for record in inventory::item_history(&r.db, id).await? {
                println!("{}  {:?}  {}  {}", record.timestamp, record.action, record.user_id, record.details);
            }
        }

        "scan" => {
            let barcode = arg(args, 0, "barcode")?;
            let qty = optional_decimal(args, 1)?;
            print_cart(&cart::add_barcode_to_cart(&r.db, &r.cart, &r.config, barcode, qty).await?);
        }
        "add" => {
            let id = arg(args, 0, "item id")?;
            let qty = optional_decimal(args, 1)?;
            print_cart(&cart::add_to_cart(&r.db, &r.cart, &r.config, id, qty).await?);
        }
        "qty" => {
            let id = arg(args, 0, "item id")?;
            let qty = decimal(arg(args, 1, "quantity")?)?;
            print_cart(&cart::set_line_quantity(&r.db, &r.cart, &r.config, id, qty).await?);
        }
        "rm" => {
            let id = arg(args, 0, "item id")?;
            print_cart(&cart::remove_from_cart(&r.cart, &r.config, id).await);
        }
        "discount" => {
            let id = arg(args, 0, "item id")?;
            let apply = arg(args, 1, "on|off")? == "on";
            print_cart(&cart::toggle_line_discount(&r.cart, &r.config, id, apply).await?);
        }
        "note" => print_cart(&cart::set_notes(&r.cart, &r.config, args.join(" ")).await),
        "cart" => print_cart(&cart::get_cart(&r.cart, &r.config).await),
        "discard" => print_cart(&cart::discard_cart(&r.cart, &r.config).await),

        "pay" => {
            let amount = Money::from_decimal(decimal(arg(args, 0, "amount")?)?);
            let method = if args.len() > 1 { args[1..].join(" ") } else { "Efectivo".to_string() };
            let response =
                checkout::add_payment(&r.db, &r.cart, &r.config, &r.session, &method, amount).await?;
            match response.outcome {
                PaymentOutcome::Outstanding { remaining } => println!("Remaining: {remaining}"),
                PaymentOutcome::Settled { change_due } => println!("Settled. Change: {change_due}"),
            }
            if let Some(tx) = response.transaction {
                print_transaction(&tx);
            }
        }
        "cancel" => print_cart(&checkout::cancel_checkout(&r.cart, &r.config).await),

        "save" => {
            let name = (!args.is_empty()).then(|| args.join(" "));
            let saved = saved_carts::save_cart(&r.db, &r.cart, name).await?;
            println!("Saved {} as \"{}\"", saved.id, saved.name);
        }
        "carts" => {
            for saved in saved_carts::list_saved_carts(&r.db).await? {
                println!("{}  {:<16} {} lines  {}", saved.id, saved.name, saved.lines.len(), saved.saved_at);
            }
        }
        "load" => {
            let id = arg(args, 0, "saved cart id")?;
            print_cart(&saved_carts::load_saved_cart(&r.db, &r.cart, &r.config, id).await?);
        }
        "drop" => {
            let id = arg(args, 0, "saved cart id")?;
            saved_carts::delete_saved_cart(&r.db, id).await?;
        }

        "sales" => {
            let query = args.join(" ");
            for tx in history::search_history(&r.db, &query, Some(20)).await? {
                println!("{}  {}  {:>10}  {}", tx.id, tx.timestamp, tx.total, tx.user_id);
            }
        }
        "return" => {
            let tx_id = arg(args, 0, "transaction id")?;
            let item_id = arg(args, 1, "item id")?;
            let qty = decimal(arg(args, 2, "quantity")?)?;
            print_transaction(&history::return_item(&r.db, &r.session, tx_id, item_id, qty).await?);
        }
        "report" => {
            let report = reports::sales_report(&r.db, None).await?;
            println!("Sales: {}   Gross: {}", report.transaction_count, report.gross_total);
            if let Some(best) = report.best_seller() {
                println!("Best seller:  {} ({})", best.user_id, best.total);
            }
            if let Some(worst) = report.worst_seller() {
                println!("Worst seller: {} ({})", worst.user_id, worst.total);
            }
            if let Some(most) = report.most_sold() {
                println!("Most sold:    {} ({})", most.name, most.net_quantity());
            }
            if let Some(least) = report.least_sold() {
                println!("Least sold:   {} ({})", least.name, least.net_quantity());
            }
        }

        "rates" => {
            let view = rates::get_rates(&r.db, &r.config).await?;
            println!("Base: {}   Display: {}", view.rates.base, view.display_currency);
            for (code, rate) in &view.rates.rates {
                println!("  {code} = {rate}");
            }
        }
        "rate" => {
            let code = arg(args, 0, "currency")?;
            let value = decimal(arg(args, 1, "rate")?)?;
            rates::set_rate(&r.db, &r.config, &r.session, code, value).await?;
        }
        "show" => {
            let code = rates::set_display_currency(&r.db, &r.config, arg(args, 0, "currency")?).await?;
            println!("Showing amounts in {code}");
        }

        "users" => {
            let current = session::current_operator(&r.session).await.map(|op| op.id);
            for op in session::list_operators(&r.session).await {
                let marker = if current.as_deref() == Some(op.id.as_str()) { "*" } else { " " };
                println!("{marker} {}  {} ({:?})", op.id, op.name, op.role);
            }
        }
        "user" => {
            let op = session::select_operator(&r.session, arg(args, 0, "operator id")?).await?;
            println!("Operator: {}", op.name);
        }

        other => println!("Unknown command `{other}`. Type `help`."),
    }
    Ok(())
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str, ApiError> {
    args.get(index)
        .copied()
        .ok_or_else(|| ApiError::validation(format!("missing {name}")))
}

fn decimal(raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|_| ApiError::validation(format!("not a number: {raw}")))
}

/// Quantity argument at `index`, 1 when absent.
fn optional_decimal(args: &[&str], index: usize) -> Result<Decimal, ApiError> {
    args.get(index).map_or(Ok(Decimal::ONE), |raw| decimal(raw))
}

fn print_cart(summary: &CartSummary) {
    if summary.lines.is_empty() {
        println!("(empty cart)");
        return;
    }
    for line in &summary.lines {
        println!(
            "  {:<24} {:>8} x {:>10} = {:>10}{}",
            line.name,
            line.requested_quantity,
            line.effective_price(),
            line.line_total(),
            if line.apply_discount { "  (discount)" } else { "" }
        );
    }
    println!("  Subtotal {:>10}", summary.subtotal);
    println!("  Tax      {:>10}", summary.tax);
    println!("  Total    {:>10}", summary.total);
    if !summary.payments.is_empty() {
        println!("  Paid     {:>10}", summary.amount_paid);
        println!("  Due      {:>10}", summary.remaining_due);
    }
    if !summary.notes.is_empty() {
        println!("  Notes: {}", summary.notes);
    }
}

fn print_transaction(tx: &Transaction) {
    println!("Transaction {} by {}", tx.id, tx.user_id);
    for line in &tx.lines {
        println!(
            "  {:<24} {:>8} (returned {})  {:>10}",
            line.name, line.quantity, line.quantity_returned, line.line_total
        );
    }
    println!("  Total {}   Paid {}   Change {}", tx.total, tx.amount_paid(), tx.change_given());
}
