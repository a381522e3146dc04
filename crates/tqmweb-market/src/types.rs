//! Marketplace payload types
//!
//! The open-platform API is loosely typed: identifiers and amounts arrive as
//! either strings or numbers and most fields may be missing. Every field here
//! is optional-with-default and scalar fields go through [`lenient_string`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Accept a string, number, bool or null and keep it as text
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Shipping address block of an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAddress {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address1: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address2: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address3: String,
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
}

impl RawAddress {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Address lines and city joined, skipping blanks and a repeated city
    pub fn full_address(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in [&self.address1, &self.address2, &self.address3, &self.city] {
            let part = part.trim();
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

/// One order as returned by the order listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOrder {
    #[serde(deserialize_with = "lenient_string")]
    pub order_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub order_number: String,
    /// e.g. "2024-01-05 10:21:09 +0500"
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub price: String,
    pub statuses: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub customer_first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub customer_last_name: String,
    pub address_shipping: RawAddress,
}

impl RawOrder {
    /// Identifier used by the item and finance endpoints
    pub fn id(&self) -> &str {
        if self.order_id.is_empty() {
            &self.order_number
        } else {
            &self.order_id
        }
    }

    /// Calendar date of `created_at`
    pub fn created_date(&self) -> Option<NaiveDate> {
        let date_part = self.created_at.trim().get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    pub fn customer_name(&self) -> String {
        let shipping = self.address_shipping.full_name();
        if !shipping.is_empty() {
            return shipping;
        }
        format!("{} {}", self.customer_first_name.trim(), self.customer_last_name.trim())
            .trim()
            .to_string()
    }
}

/// One page of the order listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPage {
    pub count: u64,
    #[serde(rename = "countTotal")]
    pub count_total: u64,
    pub orders: Vec<RawOrder>,
}

/// One unit line of an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOrderItem {
    #[serde(deserialize_with = "lenient_string")]
    pub order_item_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub order_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sku: String,
    #[serde(deserialize_with = "lenient_string")]
    pub shop_sku: String,
    #[serde(deserialize_with = "lenient_string")]
    pub variation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tracking_code: String,
}

impl RawOrderItem {
    /// Stable identifier for cost overrides: seller SKU, shop SKU, then title
    pub fn item_key(&self) -> String {
        [&self.sku, &self.shop_sku, &self.name]
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// A shipped package from the logistics trace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingPackage {
    #[serde(deserialize_with = "lenient_string")]
    pub tracking_number: String,
}

/// A single fee/transaction line from the settlement API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceRow {
    #[serde(deserialize_with = "lenient_string")]
    pub order_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fee_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub paid_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub statement: String,
    #[serde(deserialize_with = "lenient_string")]
    pub transaction_date: String,
}

impl FinanceRow {
    /// Whether the settlement marks this row as paid out
    pub fn is_paid(&self) -> bool {
        self.paid_status.trim().eq_ignore_ascii_case("paid")
    }

    /// Transaction date in either ISO or "05 Jan 2024" form
    pub fn date(&self) -> Option<NaiveDate> {
        let text = self.transaction_date.trim();
        let iso = text.get(..10).unwrap_or(text);
        NaiveDate::parse_from_str(iso, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(text, "%d %b %Y"))
            .ok()
    }
}

/// Order listing filter
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub created_after: NaiveDate,
    pub status: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

/// Finance transaction filter
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub order_id: Option<String>,
    pub offset: u32,
    pub limit: u32,
}
