//! # Validation Module
//!
//! Input checks that run before any ledger mutation.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Presentation                                                 │
//! │  └── Immediate feedback (empty fields, obvious typos)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Ledger rules: prices present, quantities non-negative,            │
//! │      whole counts for discrete items, payment amounts positive         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL / CHECK constraints                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{StockItemInput, Unit};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_BARCODE_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a stock item name: non-empty, at most 200 characters.
///
/// ```rust
/// use bodega_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Harina P.A.N.").is_ok());
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

/// Validates a barcode: non-empty, at most 64 characters.
///
/// Barcodes are search keys only, so any printable text is accepted.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    required_text("barcode", barcode, MAX_BARCODE_LEN)?;

    if barcode.trim().chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment method label.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    required_text("payment method", method, MAX_LABEL_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// A price must be present and not negative.
pub fn validate_price(field: &str, price: Option<Money>) -> ValidationResult<Money> {
    let price = price.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(price)
}

/// A stock quantity must be ≥ 0 and whole for discrete items.
///
/// ```rust
/// use bodega_core::types::Unit;
/// use bodega_core::validation::validate_stock_quantity;
/// use rust_decimal::Decimal;
///
/// assert!(validate_stock_quantity(Decimal::new(15, 1), Unit::Weight).is_ok());
/// assert!(validate_stock_quantity(Decimal::new(15, 1), Unit::Item).is_err());
/// assert!(validate_stock_quantity(Decimal::NEGATIVE_ONE, Unit::Item).is_err());
/// ```
pub fn validate_stock_quantity(quantity: Decimal, unit: Unit) -> ValidationResult<()> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(ValidationError::MustBeNonNegative {
            field: "quantity".to_string(),
        });
    }
    validate_unit_granularity(quantity, unit)
}

/// Discrete items only move in whole numbers.
pub fn validate_unit_granularity(quantity: Decimal, unit: Unit) -> ValidationResult<()> {
    if !unit.allows_fraction() && !quantity.fract().is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: format!("{} is not a whole number of items", quantity.normalize()),
        });
    }
    Ok(())
}

/// A payment amount must be strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

/// A return must be positive and within what was sold and not yet returned.
pub fn validate_return_quantity(requested: Decimal, remaining: Decimal) -> ValidationResult<()> {
    if requested <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "return quantity".to_string(),
        });
    }
    if requested > remaining {
        return Err(ValidationError::ExceedsRemaining {
            field: "return quantity".to_string(),
            requested,
            remaining,
        });
    }
    Ok(())
}

// =============================================================================
// Compound Validators
// =============================================================================

/// Validated stock item fields, ready to persist.
#[derive(Debug, Clone)]
pub struct ValidStockItem {
    pub name: String,
    pub barcode: String,
    pub buying_price: Money,
    pub selling_price: Money,
    pub quantity: Decimal,
    pub unit: Unit,
    pub includes_tax: bool,
    pub discount: crate::types::Discount,
}

/// Checks every field of a create/update request.
///
/// The discount percent is clamped into [0, 100] instead of rejected.
pub fn validate_stock_input(input: &StockItemInput) -> ValidationResult<ValidStockItem> {
    validate_item_name(&input.name)?;
    validate_barcode(&input.barcode)?;
    let buying_price = validate_price("buying price", input.buying_price)?;
    let selling_price = validate_price("selling price", input.selling_price)?;
    validate_stock_quantity(input.quantity, input.unit)?;

    Ok(ValidStockItem {
        name: input.name.trim().to_string(),
        barcode: input.barcode.trim().to_string(),
        buying_price,
        selling_price,
        quantity: input.quantity.normalize(),
        unit: input.unit,
        includes_tax: input.includes_tax,
        discount: crate::types::Discount::from_percent(input.discount_percent),
    })
}

/// Checks an image payload against the size ceiling.
pub fn validate_image_size(len: usize, max: usize) -> Result<(), crate::CoreError> {
    if len > max {
        return Err(crate::CoreError::PayloadTooLarge { size: len, max });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> StockItemInput {
        StockItemInput {
            name: "Arroz Primor".to_string(),
            barcode: "7591002000011".to_string(),
            buying_price: Some(Money::from_cents(85)),
            selling_price: Some(Money::from_cents(120)),
            quantity: dec!(30),
            unit: Unit::Weight,
            includes_tax: false,
            discount_percent: dec!(5),
            expected_version: None,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let valid = validate_stock_input(&input()).unwrap();
        assert_eq!(valid.name, "Arroz Primor");
        assert_eq!(valid.discount.bps(), 500);
    }

    #[test]
    fn test_missing_price_is_rejected() {
        let mut bad = input();
        bad.selling_price = None;
        let err = validate_stock_input(&bad).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "selling price"));
    }

    #[test]
    fn test_blank_barcode_is_rejected() {
        let mut bad = input();
        bad.barcode = "  ".to_string();
        assert!(matches!(
            validate_stock_input(&bad),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let mut bad = input();
        bad.quantity = dec!(-1);
        assert!(matches!(
            validate_stock_input(&bad),
            Err(ValidationError::MustBeNonNegative { .. })
        ));
    }

    #[test]
    fn test_discount_is_clamped() {
        let mut generous = input();
        generous.discount_percent = dec!(250);
        assert_eq!(validate_stock_input(&generous).unwrap().discount.bps(), 10_000);
    }

    #[test]
    fn test_fractional_items_are_rejected() {
        assert!(validate_unit_granularity(dec!(2.5), Unit::Item).is_err());
        assert!(validate_unit_granularity(dec!(2.0), Unit::Item).is_ok());
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_cents(-5)).is_err());
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
    }

    #[test]
    fn test_return_bounds() {
        assert!(validate_return_quantity(dec!(4), dec!(3)).is_err());
        assert!(validate_return_quantity(dec!(0), dec!(3)).is_err());
        assert!(validate_return_quantity(dec!(3), dec!(3)).is_ok());
    }

    #[test]
    fn test_image_ceiling() {
        assert!(validate_image_size(1024 * 1024, 1024 * 1024).is_ok());
        assert!(validate_image_size(1024 * 1024 + 1, 1024 * 1024).is_err());
    }
}
