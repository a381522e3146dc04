//! Core data models: cached orders, finance summaries, cost and payment records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label of the sale-price line in every finance breakdown
pub const PRODUCT_PRICE_LABEL: &str = "Product Price Paid by Buyer";

pub const STATUS_PAID: &str = "Paid";
pub const STATUS_NOT_PAID: &str = "Not Paid";
pub const STATUS_UNAVAILABLE: &str = "Unavailable";

/// Status fragments that mark an order or item as returned/failed
pub const RETURN_KEYWORDS: &[&str] = &["return", "fail", "cancel", "lost", "damage"];

/// Whether a marketplace status text means the goods came back or never left
pub fn is_return_status(status: &str) -> bool {
    let status = status.to_lowercase();
    RETURN_KEYWORDS.iter().any(|k| status.contains(k))
}

/// Buyer contact details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Units of one item key with one status inside an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub key: String,
    pub title: String,
    pub quantity: u32,
    pub tracking_number: String,
    pub status: String,
}

/// One line of a finance breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: Decimal,
    pub amount_fmt: String,
}

/// Aggregated settlement state of one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    /// Sum of the breakdown
    pub net_total: Decimal,
    /// Formatted `net_total`
    pub invoice_amount: String,
    pub statement: String,
    /// "Paid", "Not Paid" or "Unavailable"
    pub paid_status: String,
    pub breakdown: Vec<BreakdownLine>,
}

impl FinanceSummary {
    /// Summary for an order the settlement API has no rows for yet
    pub fn not_paid(currency: &str) -> Self {
        Self {
            net_total: Decimal::ZERO,
            invoice_amount: crate::money::format_money(Decimal::ZERO, currency),
            statement: String::new(),
            paid_status: STATUS_NOT_PAID.to_string(),
            breakdown: Vec::new(),
        }
    }

    /// Placeholder when the settlement API could not be reached
    pub fn unavailable(reason: &str, currency: &str) -> Self {
        Self {
            statement: reason.to_string(),
            paid_status: STATUS_UNAVAILABLE.to_string(),
            ..Self::not_paid(currency)
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid_status == STATUS_PAID
    }

    pub fn is_unavailable(&self) -> bool {
        self.paid_status == STATUS_UNAVAILABLE
    }
}

/// An ingested order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub customer: Customer,
    pub price: Decimal,
    pub statuses: Vec<String>,
    pub items: Vec<OrderItem>,
    /// Filled on first view and kept for the life of the process
    pub finance: Option<FinanceSummary>,
}

impl Order {
    /// Order-level return/failure from its status list
    pub fn is_returned(&self) -> bool {
        self.statuses.iter().any(|s| is_return_status(s))
    }
}

/// Per-key cost override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub product_cost: Decimal,
    pub packaging: Decimal,
    pub vendor: String,
}

/// One recorded payment to a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub user: String,
    pub vendor: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}
