//! # Domain Types
//!
//! Back-office records shared by the database and sync crates.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Customer     │   │    DailySale    │   │    DataType     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  name           │   │  sale_id        │   │  customers      │        │
//! │  │  phone          │   │  date, time     │   │  bills          │        │
//! │  │  address?       │   │  customer       │   │  quotations     │        │
//! │  │  email?         │   │  amount         │   │  dailySales     │        │
//! │  │  notes?         │   │  items          │   └─────────────────┘        │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Bill / Quotation / BillItem live in `billing` next to their math.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Records carry no id of their own. The document store assigns one and
//! hands back `Document<T>`; these types are the `T`.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Data Type
// =============================================================================

/// A tracked back-office collection.
///
/// The serialized label doubles as the collection name in the document store
/// and as the key in the key-value store the sync layer polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Customers,
    Bills,
    Quotations,
    DailySales,
}

impl DataType {
    /// Every tracked collection, in poll order.
    pub const ALL: [DataType; 4] = [
        DataType::Customers,
        DataType::Bills,
        DataType::Quotations,
        DataType::DailySales,
    ];

    /// Wire label, e.g. `dailySales`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataType::Customers => "customers",
            DataType::Bills => "bills",
            DataType::Quotations => "quotations",
            DataType::DailySales => "dailySales",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown data type: {s}"))
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of the shop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub notes: Option<String>,
}

impl Customer {
    /// Creates a customer with only the required fields.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    /// Search box match: name and email ignore case, phone is a plain
    /// substring. An empty term matches everyone.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }

        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.phone.contains(term)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&needle))
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    Cheque,
}

// =============================================================================
// Daily Sales
// =============================================================================

/// Customer label recorded when a bill has no customer attached.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// One entry in the daily sales ledger, appended for every bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySale {
    /// Invoice number of the bill that produced this sale.
    pub sale_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    /// Customer name, or [`WALK_IN_CUSTOMER`].
    pub customer: String,
    /// Bill total, GST included.
    pub amount: f64,
    /// Number of pieces sold (sum of line quantities).
    pub items: u32,
}

/// Aggregate figures for one day's sales.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total: f64,
    pub transactions: usize,
    pub items: u32,
    /// `total / transactions`, zero on a day without sales.
    pub average: f64,
}

impl DailySummary {
    /// Sums a day's sales.
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a DailySale>) -> Self {
        let mut summary = DailySummary::default();
        for sale in sales {
            summary.total += sale.amount;
            summary.items += sale.items;
            summary.transactions += 1;
        }

        if summary.transactions > 0 {
            summary.average = summary.total / summary.transactions as f64;
        }

        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
