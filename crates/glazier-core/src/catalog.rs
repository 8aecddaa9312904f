//! # Glass Catalog
//!
//! Static reference data: every product the shop sells with its GST-inclusive
//! rate per square foot.
//!
//! ## Lookups
//! - [`Catalog::product_by_id`] - single product for a quote or bill line
//! - [`Catalog::products_by_category`] - product picker for one category
//! - [`Catalog::categories`] - category tabs, in display order

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// A product that is priced by area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GlassProduct {
    /// Stable catalog id, e.g. `clear-5mm`.
    pub id: String,
    pub category: String,
    /// Variant within the category ("Clear", "Bronze", "White PU", ...).
    #[serde(rename = "type")]
    pub glass_type: String,
    pub thickness: String,
    /// Rate in rupees per square foot, GST included.
    pub price_per_sq_ft: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,
}

impl GlassProduct {
    /// Name printed on bills, e.g. `Clear Glass - Clear (5mm)`.
    pub fn display_name(&self) -> String {
        format!("{} - {} ({})", self.category, self.glass_type, self.thickness)
    }

    /// Short label used on bill lines, e.g. `Clear 5mm`.
    pub fn line_label(&self) -> String {
        format!("{} {}", self.glass_type, self.thickness)
    }
}

/// Category tabs in display order.
pub const GLASS_CATEGORIES: [&str; 7] = [
    "Clear Glass",
    "Bronze Glass",
    "Grey Glass",
    "Black Glass",
    "Mirror",
    "Fluted Glass",
    "Specialty Glass",
];

// (id, category, type, thickness, rate)
const STANDARD_PRODUCTS: &[(&str, &str, &str, &str, f64)] = &[
    ("clear-4mm", "Clear Glass", "Clear", "4mm", 55.0),
    ("clear-5mm", "Clear Glass", "Clear", "5mm", 65.0),
    ("clear-8mm", "Clear Glass", "Clear", "8mm", 125.0),
    ("clear-12mm", "Clear Glass", "Clear", "12mm", 160.0),
    ("bronze-4mm", "Bronze Glass", "Bronze", "4mm", 70.0),
    ("bronze-5mm", "Bronze Glass", "Bronze", "5mm", 85.0),
    ("bronze-8mm", "Bronze Glass", "Bronze", "8mm", 180.0),
    ("bronze-12mm", "Bronze Glass", "Bronze", "12mm", 250.0),
    ("grey-4mm", "Grey Glass", "Grey", "4mm", 65.0),
    ("grey-5mm", "Grey Glass", "Grey", "5mm", 75.0),
    ("grey-8mm", "Grey Glass", "Grey", "8mm", 180.0),
    ("grey-12mm", "Grey Glass", "Grey", "12mm", 250.0),
    ("black-4mm", "Black Glass", "Black", "4mm", 65.0),
    ("black-5mm", "Black Glass", "Black", "5mm", 75.0),
    ("black-8mm", "Black Glass", "Black", "8mm", 180.0),
    ("black-12mm", "Black Glass", "Black", "12mm", 250.0),
    ("mirror-5mm", "Mirror", "Standard", "5mm", 125.0),
    ("mirror-bronze-5mm", "Mirror", "Bronze", "5mm", 230.0),
    ("mirror-grey-5mm", "Mirror", "Grey", "5mm", 230.0),
    ("fluted-clear-5mm", "Fluted Glass", "Clear", "5mm", 150.0),
    ("fluted-grey-5mm", "Fluted Glass", "Grey", "5mm", 180.0),
    ("white-pu-4mm", "Specialty Glass", "White PU", "4mm", 120.0),
    ("grey-pu-4mm", "Specialty Glass", "Grey PU", "4mm", 130.0),
    ("lining-4mm", "Specialty Glass", "Lining", "4mm", 90.0),
    ("frosted-4mm", "Specialty Glass", "Frosted", "4mm", 100.0),
    ("white-bazari-3.5mm", "Specialty Glass", "White Bazari", "3.5mm", 45.0),
    ("white-kasumi-3.5mm", "Specialty Glass", "White Kasumi", "3.5mm", 55.0),
    ("white-karachi-3.5mm", "Specialty Glass", "White Karachi", "3.5mm", 50.0),
    ("gray-karachi-3.5mm", "Specialty Glass", "Gray Karachi", "3.5mm", 60.0),
    ("gray-swastik-3.5mm", "Specialty Glass", "Gray Swastik", "3.5mm", 60.0),
    ("gray-ginza-3.5mm", "Specialty Glass", "Gray Ginza", "3.5mm", 60.0),
    ("frosted-design", "Specialty Glass", "Frosted Design", "Various", 90.0),
    ("colour-design", "Specialty Glass", "Colour Design", "Various", 150.0),
    ("acid-colour", "Specialty Glass", "Acid Colour", "Various", 200.0),
    ("pel", "Specialty Glass", "PEL", "Various", 80.0),
];

/// Immutable product list with lookup helpers.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<GlassProduct>,
}

impl Catalog {
    /// Creates a catalog from an explicit product list.
    pub fn new(products: Vec<GlassProduct>) -> Self {
        Catalog { products }
    }

    /// The shop's standard price list.
    pub fn standard() -> Self {
        let products = STANDARD_PRODUCTS
            .iter()
            .map(|&(id, category, glass_type, thickness, rate)| GlassProduct {
                id: id.to_string(),
                category: category.to_string(),
                glass_type: glass_type.to_string(),
                thickness: thickness.to_string(),
                price_per_sq_ft: rate,
                description: None,
            })
            .collect();

        Catalog { products }
    }

    /// All products in catalog order.
    pub fn products(&self) -> &[GlassProduct] {
        &self.products
    }

    /// Looks a product up by id.
    pub fn product_by_id(&self, id: &str) -> Option<&GlassProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Like [`Catalog::product_by_id`] but reports a missing id as an error.
    pub fn require(&self, id: &str) -> CoreResult<&GlassProduct> {
        self.product_by_id(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Products of one category, in catalog order. Exact string match.
    pub fn products_by_category(&self, category: &str) -> Vec<&GlassProduct> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let catalog = Catalog::standard();
        let product = catalog.product_by_id("mirror-grey-5mm").unwrap();
        assert_eq!(product.price_per_sq_ft, 230.0);
        assert_eq!(product.display_name(), "Mirror - Grey (5mm)");

        assert!(catalog.product_by_id("unobtainium").is_none());
        assert!(matches!(
            catalog.require("unobtainium"),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = Catalog::standard();
        let mirrors = catalog.products_by_category("Mirror");
        assert_eq!(mirrors.len(), 3);
        assert!(mirrors.iter().all(|p| p.category == "Mirror"));

        assert!(catalog.products_by_category("mirror").is_empty());
    }

    #[test]
    fn test_categories_match_display_order() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.categories(), GLASS_CATEGORIES.to_vec());
    }

    #[test]
    fn test_ids_are_unique() {
        let catalog = Catalog::standard();
        let mut ids: Vec<&str> = catalog.products().iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.products().len());
    }

    #[test]
    fn test_product_json_uses_type_key() {
        let catalog = Catalog::standard();
        let json = serde_json::to_value(catalog.product_by_id("pel").unwrap()).unwrap();
        assert_eq!(json["type"], "PEL");
        assert_eq!(json["pricePerSqFt"], 80.0);
    }
}
