//! Offline marketplace backed by a JSON dump
//!
//! File layout:
//!
//! ```json
//! { "orders": [ { "order_id": 1, "created_at": "...", "items": [...],
//!                 "trace": [...], "transactions": [...] } ] }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MarketError;
use crate::types::{FinanceQuery, FinanceRow, OrderPage, OrderQuery, RawOrder, RawOrderItem, TrackingPackage};
use crate::MarketplaceClient;

/// An order together with everything the API would serve for it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureOrder {
    #[serde(flatten)]
    pub order: RawOrder,
    #[serde(default)]
    pub items: Vec<RawOrderItem>,
    #[serde(default)]
    pub trace: Vec<TrackingPackage>,
    #[serde(default)]
    pub transactions: Vec<FinanceRow>,
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    orders: Vec<FixtureOrder>,
}

/// Marketplace client that answers from memory
#[derive(Debug, Clone, Default)]
pub struct FixtureMarketplace {
    orders: Vec<FixtureOrder>,
}

impl FixtureMarketplace {
    pub fn from_orders(orders: Vec<FixtureOrder>) -> Self {
        Self { orders }
    }

    pub fn from_json(content: &str) -> Result<Self, MarketError> {
        let file: FixtureFile = serde_json::from_str(content)
            .map_err(|e| MarketError::Fixture { message: e.to_string() })?;
        Ok(Self::from_orders(file.orders))
    }

    pub async fn from_file(path: &Path) -> Result<Self, MarketError> {
        let content = tokio::fs::read_to_string(path).await?;
        let market = Self::from_json(&content)?;
        log::info!("Loaded {} fixture orders from {}", market.orders.len(), path.display());
        Ok(market)
    }

    fn find(&self, order_id: &str) -> Option<&FixtureOrder> {
        self.orders.iter().find(|o| o.order.id() == order_id)
    }
}

#[async_trait]
impl MarketplaceClient for FixtureMarketplace {
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, MarketError> {
        let matching: Vec<RawOrder> = self
            .orders
            .iter()
            .map(|o| &o.order)
            .filter(|o| o.created_date().map_or(true, |d| d >= query.created_after))
            .filter(|o| match &query.status {
                Some(status) => o.statuses.iter().any(|s| s.eq_ignore_ascii_case(status)),
                None => true,
            })
            .cloned()
            .collect();

        let count_total = matching.len() as u64;
        let orders: Vec<RawOrder> = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok(OrderPage {
            count: orders.len() as u64,
            count_total,
            orders,
        })
    }

    async fn order_items(&self, order_id: &str) -> Result<Vec<RawOrderItem>, MarketError> {
        Ok(self.find(order_id).map(|o| o.items.clone()).unwrap_or_default())
    }

    async fn order_trace(&self, order_id: &str) -> Result<Vec<TrackingPackage>, MarketError> {
        Ok(self.find(order_id).map(|o| o.trace.clone()).unwrap_or_default())
    }

    async fn finance_transactions(&self, query: &FinanceQuery) -> Result<Vec<FinanceRow>, MarketError> {
        let rows: Vec<FinanceRow> = self
            .orders
            .iter()
            .filter(|o| query.order_id.as_deref().map_or(true, |id| o.order.id() == id))
            .flat_map(|o| o.transactions.iter())
            .filter(|row| row.date().map_or(true, |d| d >= query.start && d <= query.end))
            .cloned()
            .collect();

        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}
