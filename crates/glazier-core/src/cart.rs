//! # Cart
//!
//! The storefront cart: priced glass pieces waiting for checkout.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action                  Method               Effect                    │
//! │  ──────                  ──────               ──────                    │
//! │  Add to cart ──────────► add() ─────────────► merge or push line        │
//! │  Change quantity ──────► update_quantity() ─► rescale line price        │
//! │  Remove ───────────────► remove() ──────────► drop line                 │
//! │  Clear ────────────────► clear() ───────────► drop all lines            │
//! │  Checkout total ───────► total() ───────────► Σ line prices             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Two additions merge into one line when product, width, height and unit
//! all match. The same product cut to a different size is a separate line.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::GlassProduct;
use crate::error::{CoreError, CoreResult};
use crate::pricing::{calculate_price, Dimensions};
use crate::validation::validate_quantity;
use crate::MAX_CART_ITEMS;

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Stable key for this line, derived from product and dimensions.
    pub line_id: String,
    pub name: String,
    /// GST-inclusive price for the whole line.
    pub price: f64,
    pub dimensions: Dimensions,
    pub quantity: u32,
    pub product: GlassProduct,
}

impl CartItem {
    /// Prices `quantity` pieces of `product` cut to `dimensions`.
    pub fn new(product: &GlassProduct, dimensions: Dimensions, quantity: u32) -> Self {
        let calc = calculate_price(product, &dimensions, f64::from(quantity));
        CartItem {
            line_id: line_key(&product.id, &dimensions),
            name: product.display_name(),
            price: calc.total_price,
            dimensions,
            quantity,
            product: product.clone(),
        }
    }

    fn unit_price(&self) -> f64 {
        self.price / f64::from(self.quantity)
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.price = self.unit_price() * f64::from(quantity);
        self.quantity = quantity;
    }
}

fn line_key(product_id: &str, dims: &Dimensions) -> String {
    format!("{}:{}x{}:{}", product_id, dims.width, dims.height, dims.unit)
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by product + dimensions
/// - Every line has quantity > 0
/// - At most MAX_CART_ITEMS lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a line, or merges it into the matching line.
    ///
    /// A merged line keeps its per-piece price and takes the combined
    /// quantity. Returns the id of the affected line.
    ///
    /// Fails without touching the cart when the line's quantity, or the
    /// merged quantity, is zero or above `MAX_ITEM_QUANTITY`.
    pub fn add(&mut self, item: CartItem) -> CoreResult<String> {
        validate_quantity(f64::from(item.quantity))?;

        if let Some(existing) = self.items.iter_mut().find(|i| i.line_id == item.line_id) {
            let quantity = existing.quantity.checked_add(item.quantity).unwrap_or(u32::MAX);
            validate_quantity(f64::from(quantity))?;
            existing.set_quantity(quantity);
            return Ok(existing.line_id.clone());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        let line_id = item.line_id.clone();
        self.items.push(item);
        Ok(line_id)
    }

    /// Sets the quantity of a line, rescaling its price. Zero removes it.
    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(line_id);
        }
        validate_quantity(f64::from(quantity))?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.line_id == line_id)
            .ok_or_else(|| CoreError::CartItemNotFound(line_id.to_string()))?;
        item.set_quantity(quantity);
        Ok(())
    }

    pub fn remove(&mut self, line_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.line_id != line_id);

        if self.items.len() == before {
            return Err(CoreError::CartItemNotFound(line_id.to_string()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Checkout total, GST included.
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }

    /// Pieces across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
