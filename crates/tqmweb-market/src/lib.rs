//! Marketplace open-platform client
//!
//! Read-only access to the seller APIs the dashboard needs: order listing,
//! order items, logistics tracking and finance transaction details.

use async_trait::async_trait;
use std::sync::Arc;

pub mod client;
pub mod error;
pub mod fixture;
pub mod types;

pub use client::{sign_request, Credentials, HttpMarketplaceClient};
pub use error::MarketError;
pub use fixture::{FixtureMarketplace, FixtureOrder};
pub use types::{
    FinanceQuery, FinanceRow, OrderPage, OrderQuery, RawAddress, RawOrder, RawOrderItem, TrackingPackage,
};

/// Marketplace client reference type
pub type MarketRef = Arc<dyn MarketplaceClient>;

/// Trait for marketplace data sources
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// One page of orders created after the query date
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, MarketError>;

    /// Unit lines of one order
    async fn order_items(&self, order_id: &str) -> Result<Vec<RawOrderItem>, MarketError>;

    /// Packages and tracking numbers of one order
    async fn order_trace(&self, order_id: &str) -> Result<Vec<TrackingPackage>, MarketError>;

    /// One page of settlement rows in a date window
    async fn finance_transactions(&self, query: &FinanceQuery) -> Result<Vec<FinanceRow>, MarketError>;
}
