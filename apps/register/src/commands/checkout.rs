//! # Checkout Commands
//!
//! Drives the open cart through payment collection to a committed sale.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_payment(method, amount)                          │
//! │                                                                         │
//! │  lock cart ─────────────────────────────────────────────┐              │
//! │       │                                                  │ held until  │
//! │       ▼                                                  │ return      │
//! │  record_payment → remaining = total − paid               │              │
//! │       │                                                  │              │
//! │       ├── remaining > 0 ──► Outstanding { remaining }    │              │
//! │       │                                                  │              │
//! │       └── remaining ≤ 0 ──► commit_sale (one SQLite tx)  │              │
//! │                 │                                        │              │
//! │                 ├── Ok  ──► cart.clear()                 │              │
//! │                 │           Settled { change_due }       │              │
//! │                 │                                        │              │
//! │                 └── Err ──► pop_payment()                │              │
//! │                             error returned, cart as before             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{checkout, CartSummary, CheckoutPhase, Money, PaymentOutcome, Transaction};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::cart::summarize;
use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState, SessionState};

/// Result of one payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub outcome: PaymentOutcome,
    /// The committed sale, present once the cart settles.
    pub transaction: Option<Transaction>,
    /// The cart after the payment (empty after a commit).
    pub cart: CartSummary,
}

/// Records a payment; commits the sale when it settles the balance.
///
/// ## Errors
/// - `EMPTY_CART` with no lines, `VALIDATION_ERROR` for amount ≤ 0
/// - any commit failure; the payment is taken back and nothing is written
pub async fn add_payment(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    session: &SessionState,
    method: &str,
    amount: Money,
) -> Result<PaymentResponse, ApiError> {
    debug!(method = %method, amount = %amount, "add_payment command");

    let operator = session.require_current().await?;
    let rate = config.tax_rate();

    let mut guard = cart.lock().await;
    let outcome = checkout::record_payment(&mut guard, method, amount, rate)?;

    let PaymentOutcome::Settled { change_due } = outcome else {
        info!(amount = %amount, outcome = ?outcome, "Partial payment recorded");
        return Ok(PaymentResponse {
            outcome,
            transaction: None,
            cart: summarize(&guard, config),
        });
    };

    match db.inner().ledger().commit_sale(&guard, &operator.id, rate).await {
        Ok(transaction) => {
            guard.clear();
            info!(
                transaction = %transaction.id,
                total = %transaction.total,
                change = %change_due,
                "Checkout complete"
            );
            Ok(PaymentResponse {
                outcome,
                transaction: Some(transaction),
                cart: summarize(&guard, config),
            })
        }
        Err(e) => {
            warn!(error = %e, "Commit failed, taking back the settling payment");
            guard.pop_payment();
            Err(e.into())
        }
    }
}

/// Commits a cart that is already paid in full.
///
/// Retry path after a failed commit: the operator re-enters the last
/// payment, or the cart came back from the archive already settled.
pub async fn complete_sale(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    session: &SessionState,
) -> Result<Transaction, ApiError> {
    let operator = session.require_current().await?;
    let rate = config.tax_rate();

    let mut guard = cart.lock().await;
    if checkout::phase(&guard, rate) != CheckoutPhase::Settled {
        return Err(ApiError::validation(format!(
            "Sale is not paid in full: {} remaining",
            guard.remaining_due(rate)
        )));
    }

    let transaction = db.inner().ledger().commit_sale(&guard, &operator.id, rate).await?;
    guard.clear();
    info!(transaction = %transaction.id, "Settled sale committed");
    Ok(transaction)
}

/// Backs out of payment collection: payments and notes go, lines stay.
pub async fn cancel_checkout(cart: &CartState, config: &ConfigState) -> CartSummary {
    debug!("cancel_checkout command");
    cart.with_cart_mut(|c| {
        checkout::cancel(c);
        summarize(c, config)
    })
    .await
}

pub async fn checkout_phase(cart: &CartState, config: &ConfigState) -> CheckoutPhase {
    cart.with_cart(|c| checkout::phase(c, config.tax_rate())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::error::ErrorCode;
    use bodega_core::{StockItemInput, Unit};
    use bodega_db::{Database, DbConfig};
    use rust_decimal_macros::dec;

    async fn setup() -> (DbState, CartState, ConfigState, SessionState, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let input = StockItemInput {
            name: "Harina P.A.N.".to_string(),
            barcode: "7590001001001".to_string(),
            buying_price: Some(Money::from_cents(90)),
            selling_price: Some(Money::from_cents(1000)),
            quantity: dec!(10),
            unit: Unit::Item,
            includes_tax: false,
            discount_percent: dec!(0),
            expected_version: None,
        };
        let item = db.stock().create(&input, "1").await.unwrap();
        (
            DbState::new(db),
            CartState::new(),
            ConfigState::default(),
            SessionState::default(),
            item.id,
        )
    }

    #[tokio::test]
    async fn test_partial_payment_keeps_cart_open() {
        let (db, cart, config, session, item) = setup().await;
        add_to_cart(&db, &cart, &config, &item, dec!(2)).await.unwrap();

        let response = add_payment(&db, &cart, &config, &session, "Efectivo", Money::from_cents(500))
            .await
            .unwrap();

        assert_eq!(
            response.outcome,
            PaymentOutcome::Outstanding { remaining: Money::from_cents(1500) }
        );
        assert!(response.transaction.is_none());
        assert_eq!(checkout_phase(&cart, &config).await, CheckoutPhase::CollectingPayment);

        let summary = cancel_checkout(&cart, &config).await;
        assert!(summary.payments.is_empty());
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(checkout_phase(&cart, &config).await, CheckoutPhase::Open);
    }

    #[tokio::test]
    async fn test_settling_payment_commits_and_clears() {
        let (db, cart, config, session, item) = setup().await;
        add_to_cart(&db, &cart, &config, &item, dec!(2)).await.unwrap();

        let response = add_payment(&db, &cart, &config, &session, "Efectivo", Money::from_cents(2500))
            .await
            .unwrap();

        assert_eq!(
            response.outcome,
            PaymentOutcome::Settled { change_due: Money::from_cents(500) }
        );
        let sale = response.transaction.unwrap();
        assert_eq!(sale.user_id, "1");
        assert_eq!(sale.amount_paid().cents(), 2500);
        assert!(response.cart.lines.is_empty());

        let stock = db.inner().stock().get_required(&item).await.unwrap();
        assert_eq!(stock.quantity, dec!(8));
    }

    #[tokio::test]
    async fn test_failed_commit_takes_payment_back() {
        let (db, cart, config, session, item) = setup().await;
        add_to_cart(&db, &cart, &config, &item, dec!(2)).await.unwrap();
        add_payment(&db, &cart, &config, &session, "Efectivo", Money::from_cents(500))
            .await
            .unwrap();

        db.inner()
            .stock()
            .delete(&item, "1", bodega_core::DeletePolicy::Purge)
            .await
            .unwrap();

        let err = add_payment(&db, &cart, &config, &session, "Punto", Money::from_cents(1500))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let summary = cart.with_cart(|c| c.summary(config.tax_rate())).await;
        assert_eq!(summary.payments.len(), 1);
        assert_eq!(summary.amount_paid.cents(), 500);
        assert_eq!(db.inner().ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_sale_requires_full_payment() {
        let (db, cart, config, session, item) = setup().await;
        add_to_cart(&db, &cart, &config, &item, dec!(1)).await.unwrap();

        let err = complete_sale(&db, &cart, &config, &session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Settle without committing, as a restored snapshot would be
        cart.with_cart_mut(|c| c.add_payment("Efectivo", Money::from_cents(1000)))
            .await
            .unwrap();
        let sale = complete_sale(&db, &cart, &config, &session).await.unwrap();
        assert_eq!(sale.total.cents(), 1000);
        assert!(cart.with_cart(|c| c.is_empty()).await);
    }

    #[tokio::test]
    async fn test_payment_needs_an_operator() {
        let (db, cart, config, session, item) = setup().await;
        add_to_cart(&db, &cart, &config, &item, dec!(1)).await.unwrap();
        session.sign_out().await;

        let err = add_payment(&db, &cart, &config, &session, "Efectivo", Money::from_cents(1000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(cart.with_cart(|c| c.payments().is_empty()).await);
    }
}
