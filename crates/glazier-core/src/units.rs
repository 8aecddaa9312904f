//! # Unit Conversion
//!
//! Converts a measured length into feet, the unit every price is quoted in.
//!
//! ## Conversion Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Unit    Rule                                    Example                │
//! │  ─────   ─────────────────────────────────────   ─────────────────────  │
//! │  mm      value / 304.8                           304.8 mm  → 1 ft       │
//! │  cm      value / 30.48                           30.48 cm  → 1 ft       │
//! │  feet    value                                   2.5 ft    → 2.5 ft     │
//! │  inch    ceil(value / 3) * 3 / 12                13 in → 15 in → 1.25   │
//! │          (clamped to at least 1 inch)            0 in  → 1/12 ft        │
//! │  other   value (treated as feet)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inch Quantization
//! Glass is cut and charged in 3-inch steps, so an inch measurement is rounded
//! UP to the next multiple of 3 before converting. This is a pricing rule, not
//! a rounding error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Millimetres per foot.
pub const MM_PER_FOOT: f64 = 304.8;

/// Centimetres per foot.
pub const CM_PER_FOOT: f64 = 30.48;

/// Inches per foot.
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Inch measurements are charged in steps of this many inches.
pub const INCH_STEP: f64 = 3.0;

/// A unit of length accepted on quote and bill forms.
///
/// Unrecognized labels are kept as [`Unit::Other`] and convert as feet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    Mm,
    Cm,
    #[default]
    Inch,
    Feet,
    Other(String),
}

impl Unit {
    /// Units offered on the quote form, in display order.
    pub const ALL: [Unit; 4] = [Unit::Mm, Unit::Cm, Unit::Inch, Unit::Feet];

    /// Parses a unit label. Never fails; unknown labels become `Other`.
    ///
    /// ## Example
    /// ```rust
    /// use glazier_core::units::Unit;
    ///
    /// assert_eq!(Unit::parse("Inches"), Unit::Inch);
    /// assert_eq!(Unit::parse("ft"), Unit::Feet);
    /// assert_eq!(Unit::parse("yard"), Unit::Other("yard".to_string()));
    /// ```
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Unit::Mm,
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Unit::Cm,
            "inch" | "inches" | "in" => Unit::Inch,
            "feet" | "foot" | "ft" => Unit::Feet,
            _ => Unit::Other(label.to_string()),
        }
    }

    /// Canonical label stored in documents.
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::Inch => "inch",
            Unit::Feet => "feet",
            Unit::Other(label) => label,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Unit {
    fn from(label: String) -> Self {
        Unit::parse(&label)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

/// Converts a length in `unit` to feet.
///
/// Pure and infallible: non-positive or NaN input comes back as non-positive
/// or NaN output for the linear units.
///
/// ## Example
/// ```rust
/// use glazier_core::units::{to_feet, Unit};
///
/// assert_eq!(to_feet(12.0, &Unit::Inch), 1.0);
/// assert_eq!(to_feet(13.0, &Unit::Inch), 1.25);
/// assert_eq!(to_feet(304.8, &Unit::Mm), 1.0);
/// ```
pub fn to_feet(value: f64, unit: &Unit) -> f64 {
    match unit {
        Unit::Mm => value / MM_PER_FOOT,
        Unit::Cm => value / CM_PER_FOOT,
        Unit::Inch => {
            let rounded = (value / INCH_STEP).ceil() * INCH_STEP;
            if rounded < 1.0 {
                return 1.0 / INCHES_PER_FOOT;
            }
            rounded / INCHES_PER_FOOT
        }
        Unit::Feet | Unit::Other(_) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_unit_is_inch() {
        assert_eq!(Unit::default(), Unit::Inch);
    }

    #[test]
    fn test_feet_is_identity() {
        for x in [0.0, 1.0, 2.5, -3.0, 1234.5678] {
            assert_eq!(to_feet(x, &Unit::Feet), x);
        }
    }

    #[test]
    fn test_inch_rounds_up_to_three_inch_step() {
        assert_eq!(to_feet(12.0, &Unit::Inch), 1.0);
        assert_eq!(to_feet(13.0, &Unit::Inch), 1.25);
        assert_eq!(to_feet(24.0, &Unit::Inch), 2.0);
        assert_eq!(to_feet(36.0, &Unit::Inch), 3.0);
        // 2 and 0.5 both round up to 3 inches
        assert_eq!(to_feet(2.0, &Unit::Inch), 0.25);
        assert_eq!(to_feet(0.5, &Unit::Inch), 0.25);
    }

    #[test]
    fn test_inch_floor_clamp() {
        assert_eq!(to_feet(0.0, &Unit::Inch), 1.0 / 12.0);
        assert_eq!(to_feet(-7.0, &Unit::Inch), 1.0 / 12.0);
    }

    #[test]
    fn test_metric_units() {
        assert!((to_feet(304.8, &Unit::Mm) - 1.0).abs() < 1e-12);
        assert!((to_feet(30.48, &Unit::Cm) - 1.0).abs() < 1e-12);
        assert!(to_feet(-30.48, &Unit::Cm) < 0.0);
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        let unit = Unit::parse("cubits");
        assert_eq!(unit, Unit::Other("cubits".to_string()));
        assert_eq!(to_feet(7.0, &unit), 7.0);
    }

    #[test]
    fn test_nan_propagates_for_linear_units() {
        assert!(to_feet(f64::NAN, &Unit::Mm).is_nan());
        assert!(to_feet(f64::NAN, &Unit::Feet).is_nan());
    }

    #[test]
    fn test_unit_serde_uses_labels() {
        let json = serde_json::to_string(&Unit::Inch).unwrap();
        assert_eq!(json, "\"inch\"");

        let unit: Unit = serde_json::from_str("\"mm\"").unwrap();
        assert_eq!(unit, Unit::Mm);

        let unit: Unit = serde_json::from_str("\"yard\"").unwrap();
        assert_eq!(unit.to_string(), "yard");
    }
}
