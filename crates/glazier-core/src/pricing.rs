//! # Price Calculation
//!
//! Turns a product rate, a pair of measured dimensions and a quantity into an
//! area, a GST-inclusive total and its tax breakdown.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        calculate_price()                                │
//! │                                                                         │
//! │  width, height, unit                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  to_feet() ──► width_ft, height_ft                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  area        = width_ft × height_ft × quantity                          │
//! │  total_price = area × price_per_sq_ft       (catalog rate includes GST) │
//! │  base_price  = total_price / 1.18                                       │
//! │  tax_amount  = total_price − base_price                                 │
//! │                                                                         │
//! │  No rounding here. Display code rounds to 2 places.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why floats?
//! Areas are fractional square feet and the catalog rate is per square foot,
//! so the result is inherently fractional. The calculator keeps full
//! precision; [`round_for_display`] and [`format_rupees`] are applied by the
//! caller only when showing or printing an amount.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::GlassProduct;
use crate::error::CoreResult;
use crate::units::{to_feet, Unit};
use crate::validation::{validate_dimensions, validate_quantity};

/// GST rate already included in every catalog price.
pub const TAX_RATE: f64 = 0.18;

/// Currency symbol used on quotes and invoices.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Measured size of a glass piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    #[ts(as = "String")]
    pub unit: Unit,
}

impl Dimensions {
    /// Creates dimensions in the given unit.
    pub fn new(width: f64, height: f64, unit: Unit) -> Self {
        Dimensions {
            width,
            height,
            unit,
        }
    }
}

/// The measured dimensions echoed back with their values in feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedDimensions {
    pub width: f64,
    pub height: f64,
    #[ts(as = "String")]
    pub unit: Unit,
    pub width_in_feet: f64,
    pub height_in_feet: f64,
}

/// Result of pricing one line. Derived data: never persisted, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculation {
    pub dimensions: ConvertedDimensions,
    /// Square feet, already multiplied by quantity.
    pub area: f64,
    /// Pre-tax amount.
    pub base_price: f64,
    pub tax_amount: f64,
    /// Tax-inclusive amount.
    pub total_price: f64,
    pub price_per_sq_ft: f64,
}

/// Prices `quantity` pieces of `product` cut to `dims`.
///
/// Never fails. NaN or negative input yields NaN or negative output; use
/// [`calculate_price_checked`] to reject such input instead.
///
/// ## Example
/// ```rust
/// use glazier_core::catalog::Catalog;
/// use glazier_core::pricing::{calculate_price, round_for_display, Dimensions};
/// use glazier_core::units::Unit;
///
/// let catalog = Catalog::standard();
/// let product = catalog.product_by_id("clear-5mm").unwrap(); // ₹65 / sq ft
///
/// let quote = calculate_price(product, &Dimensions::new(24.0, 36.0, Unit::Inch), 1.0);
/// assert_eq!(quote.area, 6.0);
/// assert_eq!(quote.total_price, 390.0);
/// assert_eq!(round_for_display(quote.base_price), 330.51);
/// assert_eq!(round_for_display(quote.tax_amount), 59.49);
/// ```
pub fn calculate_price(product: &GlassProduct, dims: &Dimensions, quantity: f64) -> PriceCalculation {
    let width_in_feet = to_feet(dims.width, &dims.unit);
    let height_in_feet = to_feet(dims.height, &dims.unit);

    let area = width_in_feet * height_in_feet * quantity;

    let total_price = area * product.price_per_sq_ft;
    let base_price = total_price / (1.0 + TAX_RATE);
    let tax_amount = total_price - base_price;

    PriceCalculation {
        dimensions: ConvertedDimensions {
            width: dims.width,
            height: dims.height,
            unit: dims.unit.clone(),
            width_in_feet,
            height_in_feet,
        },
        area,
        base_price,
        tax_amount,
        total_price,
        price_per_sq_ft: product.price_per_sq_ft,
    }
}

/// Validates the input, then prices it with the unchanged formula.
///
/// ## Errors
/// - Width/height not finite or not positive
/// - Quantity not finite or not positive
pub fn calculate_price_checked(
    product: &GlassProduct,
    dims: &Dimensions,
    quantity: f64,
) -> CoreResult<PriceCalculation> {
    validate_dimensions(dims)?;
    validate_quantity(quantity)?;
    Ok(calculate_price(product, dims, quantity))
}

/// Rounds an amount to 2 decimal places for display.
#[inline]
pub fn round_for_display(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount as rupees with 2 decimal places, e.g. `₹390.00`.
pub fn format_rupees(amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}{:.2}", CURRENCY_SYMBOL, -amount)
    } else {
        format!("{}{:.2}", CURRENCY_SYMBOL, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(rate: f64) -> GlassProduct {
        GlassProduct {
            id: "test".to_string(),
            category: "Clear Glass".to_string(),
            glass_type: "Clear".to_string(),
            thickness: "5mm".to_string(),
            price_per_sq_ft: rate,
            description: None,
        }
    }

    #[test]
    fn test_reference_quote() {
        let quote = calculate_price(&product(65.0), &Dimensions::new(24.0, 36.0, Unit::Inch), 1.0);

        assert_eq!(quote.dimensions.width_in_feet, 2.0);
        assert_eq!(quote.dimensions.height_in_feet, 3.0);
        assert_eq!(quote.area, 6.0);
        assert_eq!(quote.total_price, 390.0);
        assert_eq!(round_for_display(quote.base_price), 330.51);
        assert_eq!(round_for_display(quote.tax_amount), 59.49);
        assert_eq!(quote.price_per_sq_ft, 65.0);
    }

    #[test]
    fn test_tax_breakdown_adds_up() {
        let quote = calculate_price(&product(137.0), &Dimensions::new(1234.0, 987.0, Unit::Mm), 3.0);

        let expected_total = quote.dimensions.width_in_feet * quote.dimensions.height_in_feet * 3.0 * 137.0;
        assert!((quote.total_price - expected_total).abs() < 1e-9);
        assert!((quote.base_price - quote.total_price / 1.18).abs() < 1e-9);
        assert!((quote.base_price + quote.tax_amount - quote.total_price).abs() < 1e-9);
    }

    #[test]
    fn test_quantity_scales_area() {
        let one = calculate_price(&product(100.0), &Dimensions::new(2.0, 3.0, Unit::Feet), 1.0);
        let four = calculate_price(&product(100.0), &Dimensions::new(2.0, 3.0, Unit::Feet), 4.0);

        assert_eq!(one.area, 6.0);
        assert_eq!(four.area, 24.0);
        assert_eq!(four.total_price, 2400.0);
    }

    #[test]
    fn test_degenerate_input_propagates() {
        let quote = calculate_price(&product(65.0), &Dimensions::new(f64::NAN, 2.0, Unit::Feet), 1.0);
        assert!(quote.total_price.is_nan());

        let quote = calculate_price(&product(65.0), &Dimensions::new(-2.0, 2.0, Unit::Feet), 1.0);
        assert!(quote.total_price < 0.0);
        assert!(quote.tax_amount < 0.0);
    }

    #[test]
    fn test_checked_rejects_bad_input() {
        let p = product(65.0);
        assert!(calculate_price_checked(&p, &Dimensions::new(0.0, 2.0, Unit::Feet), 1.0).is_err());
        assert!(calculate_price_checked(&p, &Dimensions::new(2.0, f64::NAN, Unit::Feet), 1.0).is_err());
        assert!(calculate_price_checked(&p, &Dimensions::new(2.0, 2.0, Unit::Feet), 0.0).is_err());

        let quote = calculate_price_checked(&p, &Dimensions::new(2.0, 2.0, Unit::Feet), 1.0).unwrap();
        assert_eq!(quote.total_price, 260.0);
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(390.0), "₹390.00");
        assert_eq!(format_rupees(330.508_474_576), "₹330.51");
        assert_eq!(format_rupees(-12.5), "-₹12.50");
    }

    #[test]
    fn test_serializes_camel_case() {
        let quote = calculate_price(&product(65.0), &Dimensions::new(12.0, 12.0, Unit::Inch), 1.0);
        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(json["totalPrice"], 65.0);
        assert_eq!(json["dimensions"]["widthInFeet"], 1.0);
        assert_eq!(json["dimensions"]["unit"], "inch");
    }
}
