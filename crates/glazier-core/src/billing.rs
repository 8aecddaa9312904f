//! # Bills and Quotations
//!
//! Line items priced by the calculator, document totals, and the numbering
//! schemes printed on invoices and quotations.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog rates include GST, so every line already carries its split:    │
//! │                                                                         │
//! │    line.total_price = line.base_price + line.tax_amount                 │
//! │                                                                         │
//! │  Document totals are plain sums of the lines:                           │
//! │                                                                         │
//! │    subtotal = Σ base_price                                              │
//! │    gst      = Σ tax_amount                                              │
//! │    total    = Σ total_price          (= subtotal + gst)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numbering
//! - Invoice: `GGC/YYMMDD/NNNN` with a random 4-digit suffix
//! - Quotation: `QTN-<epoch millis>`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::GlassProduct;
use crate::error::{CoreError, CoreResult};
use crate::pricing::{calculate_price, Dimensions, PriceCalculation};
use crate::types::{Customer, DailySale, PaymentMethod, WALK_IN_CUSTOMER};
use crate::units::Unit;

/// Prefix of every invoice number.
pub const INVOICE_PREFIX: &str = "GGC";

/// Prefix of every quotation number.
pub const QUOTATION_PREFIX: &str = "QTN";

// =============================================================================
// Line Items
// =============================================================================

/// One priced line on a bill or quotation.
///
/// Product data is frozen at the time the line is added, so later catalog
/// changes do not alter saved documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub product_id: String,
    /// Printed label, e.g. `Clear 5mm`.
    pub product_name: String,
    pub width: f64,
    pub height: f64,
    #[ts(as = "String")]
    pub unit: Unit,
    pub quantity: u32,
    pub price_per_sq_ft: f64,
    /// Square feet for the whole line.
    pub area: f64,
    pub base_price: f64,
    pub tax_amount: f64,
    pub total_price: f64,
}

impl BillItem {
    /// Builds a line from an existing calculation.
    pub fn from_calculation(product: &GlassProduct, calc: &PriceCalculation, quantity: u32) -> Self {
        BillItem {
            product_id: product.id.clone(),
            product_name: product.line_label(),
            width: calc.dimensions.width,
            height: calc.dimensions.height,
            unit: calc.dimensions.unit.clone(),
            quantity,
            price_per_sq_ft: calc.price_per_sq_ft,
            area: calc.area,
            base_price: calc.base_price,
            tax_amount: calc.tax_amount,
            total_price: calc.total_price,
        }
    }

    /// Prices `quantity` pieces of `product` and wraps the result as a line.
    pub fn priced(product: &GlassProduct, dims: &Dimensions, quantity: u32) -> Self {
        let calc = calculate_price(product, dims, f64::from(quantity));
        BillItem::from_calculation(product, &calc, quantity)
    }
}

/// Subtotal, GST and total of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

impl Totals {
    pub fn from_items(items: &[BillItem]) -> Self {
        items.iter().fold(Totals::default(), |acc, item| Totals {
            subtotal: acc.subtotal + item.base_price,
            gst: acc.gst + item.tax_amount,
            total: acc.total + item.total_price,
        })
    }
}

fn require_items(document: &str, items: &[BillItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: document.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Bill
// =============================================================================

/// A tax invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: NaiveDateTime,
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Staff member who wrote the bill.
    pub worker: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<BillItem>,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

impl Bill {
    /// Creates a bill and computes its totals.
    ///
    /// ## Errors
    /// - `EmptyDocument` when `items` is empty
    pub fn new(
        invoice_number: impl Into<String>,
        date: NaiveDateTime,
        customer: Option<Customer>,
        worker: impl Into<String>,
        payment_method: PaymentMethod,
        items: Vec<BillItem>,
    ) -> CoreResult<Self> {
        require_items("Bill", &items)?;
        let totals = Totals::from_items(&items);

        Ok(Bill {
            invoice_number: invoice_number.into(),
            date,
            customer,
            worker: worker.into(),
            payment_method,
            items,
            subtotal: totals.subtotal,
            gst: totals.gst,
            total: totals.total,
        })
    }

    /// Total pieces across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Customer name as printed, falling back to the walk-in label.
    pub fn customer_name(&self) -> &str {
        match &self.customer {
            Some(customer) if !customer.name.trim().is_empty() => &customer.name,
            _ => WALK_IN_CUSTOMER,
        }
    }

    /// The ledger entry recorded alongside this bill.
    pub fn daily_sale(&self) -> DailySale {
        DailySale {
            sale_id: self.invoice_number.clone(),
            date: self.date.date(),
            time: self.date.time(),
            customer: self.customer_name().to_string(),
            amount: self.total,
            items: self.item_count(),
        }
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// A price quotation. Same lines and totals as a bill, no payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub quotation_number: String,
    #[ts(as = "String")]
    pub date: NaiveDateTime,
    #[serde(default)]
    pub customer: Option<Customer>,
    pub items: Vec<BillItem>,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

impl Quotation {
    /// Creates a quotation and computes its totals.
    ///
    /// ## Errors
    /// - `EmptyDocument` when `items` is empty
    pub fn new(
        quotation_number: impl Into<String>,
        date: NaiveDateTime,
        customer: Option<Customer>,
        items: Vec<BillItem>,
    ) -> CoreResult<Self> {
        require_items("Quotation", &items)?;
        let totals = Totals::from_items(&items);

        Ok(Quotation {
            quotation_number: quotation_number.into(),
            date,
            customer,
            items,
            subtotal: totals.subtotal,
            gst: totals.gst,
            total: totals.total,
        })
    }
}

// =============================================================================
// Numbering
// =============================================================================

/// Formats an invoice number from its parts: `GGC/YYMMDD/NNNN`.
pub fn format_invoice_number(date: NaiveDate, suffix: u16) -> String {
    format!("{}/{}/{:04}", INVOICE_PREFIX, date.format("%y%m%d"), suffix % 10_000)
}

/// Generates an invoice number for `date` with a random suffix.
///
/// The suffix is not checked for uniqueness.
pub fn generate_invoice_number(date: NaiveDate) -> String {
    format_invoice_number(date, rand::random_range(0..10_000u16))
}

/// Generates a quotation number from a timestamp, e.g. `QTN-1760781600000`.
pub fn generate_quotation_number(now: DateTime<Utc>) -> String {
    format!("{}-{}", QUOTATION_PREFIX, now.timestamp_millis())
}

// =============================================================================
// Unit Tests
// =============================================================================
