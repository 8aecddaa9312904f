//! # glazier-core: Pure Business Logic for Glazier
//!
//! Pricing, catalog and document logic for a glass shop, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Glazier Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    apps/backoffice                              │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │        ┌───────────────────────┼───────────────────────┐                │
//! │        ▼                       ▼                       ▼                │
//! │  ┌────────────┐         ┌────────────┐          ┌────────────┐          │
//! │  │glazier-sync│────────►│ glazier-db │          │            │          │
//! │  └─────┬──────┘         └─────┬──────┘          │            │          │
//! │        └──────────────────────┴────────────────►│            │          │
//! │                                                 │            │          │
//! │  ┌──────────────────────────────────────────────┴────────────┴──────┐   │
//! │  │               ★ glazier-core (THIS CRATE) ★                      │   │
//! │  │                                                                  │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐  │   │
//! │  │   │  units  │ │ pricing │ │ catalog │ │  cart   │ │  billing  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └───────────┘  │   │
//! │  │                                                                  │   │
//! │  │   NO I/O • NO DATABASE • NO TIMERS • PURE FUNCTIONS              │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Length units and conversion to feet
//! - [`pricing`] - Area, GST-inclusive price and tax split
//! - [`catalog`] - Glass products and their rates
//! - [`cart`] - Storefront cart
//! - [`billing`] - Bill / quotation lines, totals and numbering
//! - [`types`] - Customers, daily sales, tracked data types
//! - [`validation`] - Opt-in input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output (numbering is the one
//!    place that reads randomness)
//! 2. **No I/O**: database, network and file system access belong elsewhere
//! 3. **Permissive Math**: pricing never fails; validation is opt-in
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use glazier_core::{calculate_price, Catalog, Dimensions, Unit};
//!
//! let catalog = Catalog::standard();
//! let product = catalog.product_by_id("clear-5mm").unwrap();
//!
//! let quote = calculate_price(product, &Dimensions::new(24.0, 36.0, Unit::Inch), 1.0);
//! assert_eq!(quote.total_price, 390.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod pricing;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{Bill, BillItem, Quotation, Totals};
pub use cart::{Cart, CartItem};
pub use catalog::{Catalog, GlassProduct};
pub use error::{CoreError, CoreResult, ValidationError};
pub use pricing::{calculate_price, Dimensions, PriceCalculation};
pub use types::*;
pub use units::{to_feet, Unit};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity accepted by [`validation::validate_quantity`].
pub const MAX_ITEM_QUANTITY: f64 = 999.0;
