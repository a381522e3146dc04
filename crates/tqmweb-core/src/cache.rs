//! In-memory order cache and marketplace ingestion

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tqmweb_config::MarketplaceConfig;
use tqmweb_market::{MarketRef, OrderQuery, RawOrder, RawOrderItem, TrackingPackage};

use crate::error::{CoreError, CoreResult};
use crate::models::{Customer, FinanceSummary, Order, OrderItem};
use crate::money::parse_lenient;
use crate::time::DateWindow;

const MAX_ORDER_PAGES: u32 = 1000;

#[derive(Debug, Default)]
struct CacheState {
    orders: Vec<Order>,
    loaded_at: Option<DateTime<Utc>>,
    /// Last ingestion failure; cleared by a successful refresh
    error: Option<String>,
}

/// Orders ingested from the marketplace, shared by all requests
///
/// The lock is never held across an await.
#[derive(Debug, Default)]
pub struct OrderCache {
    state: RwLock<CacheState>,
}

impl OrderCache {
    /// Empty cache; every read fails with `NotLoaded` until a refresh succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded cache from prepared orders
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            state: RwLock::new(CacheState {
                orders,
                loaded_at: Some(Utc::now()),
                error: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.read().loaded_at
    }

    /// Last ingestion error, if the most recent refresh failed
    pub fn last_error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn len(&self) -> usize {
        self.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Orders inside the window, newest first
    ///
    /// Fails while the last ingestion failed or nothing has been loaded.
    pub fn orders_in(&self, window: &DateWindow) -> CoreResult<Vec<Order>> {
        let state = self.read();
        if let Some(message) = &state.error {
            return Err(CoreError::Upstream { message: message.clone() });
        }
        if state.loaded_at.is_none() {
            return Err(CoreError::NotLoaded);
        }

        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| window.contains(&o.order_date))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then_with(|| b.order_id.cmp(&a.order_id)));
        Ok(orders)
    }

    /// Keep a resolved finance summary on the cached order
    pub fn store_finance(&self, order_id: &str, summary: &FinanceSummary) {
        let mut state = self.write();
        if let Some(order) = state.orders.iter_mut().find(|o| o.order_id == order_id) {
            order.finance = Some(summary.clone());
        }
    }

    /// Re-run ingestion and swap the result in
    ///
    /// On failure the previous orders are dropped from view and the error is
    /// kept until the next successful refresh.
    pub async fn refresh(&self, market: &MarketRef, config: &MarketplaceConfig) -> CoreResult<usize> {
        let today = Utc::now().date_naive();
        match ingest_orders(market, config, today).await {
            Ok(mut orders) => {
                let mut state = self.write();
                let resolved: HashMap<&str, &FinanceSummary> = state
                    .orders
                    .iter()
                    .filter_map(|o| o.finance.as_ref().map(|f| (o.order_id.as_str(), f)))
                    .collect();
                for order in orders.iter_mut() {
                    if let Some(summary) = resolved.get(order.order_id.as_str()) {
                        order.finance = Some((*summary).clone());
                    }
                }

                let count = orders.len();
                state.orders = orders;
                state.loaded_at = Some(Utc::now());
                state.error = None;
                log::info!("Order cache refreshed: {} orders", count);
                Ok(count)
            }
            Err(e) => {
                log::error!("Order ingestion failed: {}", e);
                self.write().error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Pull every order created since the configured start date
pub async fn ingest_orders(market: &MarketRef, config: &MarketplaceConfig, today: NaiveDate) -> CoreResult<Vec<Order>> {
    let created_after = config.ingest_start(today);
    let filters: Vec<Option<String>> = if config.statuses.is_empty() {
        vec![None]
    } else {
        config.statuses.iter().map(|s| Some(s.clone())).collect()
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut raw_orders: Vec<RawOrder> = Vec::new();

    for status in filters {
        for page in 0..MAX_ORDER_PAGES {
            let query = OrderQuery {
                created_after,
                status: status.clone(),
                offset: page * config.page_size,
                limit: config.page_size,
            };
            let batch = market.list_orders(&query).await?;
            let fetched = batch.orders.len() as u32;
            for order in batch.orders {
                if order.id().is_empty() {
                    continue;
                }
                if seen.insert(order.id().to_string()) {
                    raw_orders.push(order);
                }
            }
            if fetched < config.page_size {
                break;
            }
        }
    }

    log::info!("Listed {} orders created since {}", raw_orders.len(), created_after);

    let mut orders = Vec::with_capacity(raw_orders.len());
    for raw in raw_orders {
        let items = market.order_items(raw.id()).await?;
        let needs_trace = items.iter().any(|i| i.tracking_code.trim().is_empty());
        let trace = if needs_trace {
            market.order_trace(raw.id()).await?
        } else {
            Vec::new()
        };
        orders.push(build_order(&raw, &items, &trace, today));
    }

    Ok(orders)
}

/// Convert one marketplace order into the cached form
pub fn build_order(raw: &RawOrder, items: &[RawOrderItem], trace: &[TrackingPackage], today: NaiveDate) -> Order {
    let order_date = raw.created_date().unwrap_or_else(|| {
        log::warn!("Order {} has unreadable created_at '{}'", raw.id(), raw.created_at);
        today
    });

    let mut statuses: Vec<String> = raw
        .statuses
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if statuses.is_empty() {
        for item in items {
            let status = item.status.trim();
            if !status.is_empty() && !statuses.iter().any(|s| s == status) {
                statuses.push(status.to_string());
            }
        }
    }

    Order {
        order_id: raw.id().to_string(),
        order_date,
        customer: Customer {
            name: raw.customer_name(),
            address: raw.address_shipping.full_address(),
            phone: raw.address_shipping.phone.trim().to_string(),
        },
        price: parse_lenient(&raw.price),
        statuses,
        items: group_items(items, trace),
        finance: None,
    }
}

/// Collapse per-unit lines into one entry per `(key, status)`
///
/// Units without a tracking code take the package numbers from the trace.
pub fn group_items(items: &[RawOrderItem], trace: &[TrackingPackage]) -> Vec<OrderItem> {
    let traced: Vec<&str> = trace
        .iter()
        .map(|p| p.tracking_number.trim())
        .filter(|t| !t.is_empty())
        .collect();

    let mut grouped: Vec<(OrderItem, Vec<String>)> = Vec::new();
    for item in items {
        let key = item.item_key();
        let status = item.status.trim().to_string();

        let mut tracking: Vec<String> = Vec::new();
        match item.tracking_code.trim() {
            "" => tracking.extend(traced.iter().map(|t| t.to_string())),
            code => tracking.push(code.to_string()),
        }

        match grouped.iter_mut().find(|(g, _)| g.key == key && g.status == status) {
            Some((group, numbers)) => {
                group.quantity += 1;
                for number in tracking {
                    if !numbers.contains(&number) {
                        numbers.push(number);
                    }
                }
            }
            None => {
                let title = match item.variation.trim() {
                    "" => item.name.trim().to_string(),
                    variation => format!("{} ({})", item.name.trim(), variation),
                };
                let mut numbers: Vec<String> = Vec::new();
                for number in tracking {
                    if !numbers.contains(&number) {
                        numbers.push(number);
                    }
                }
                grouped.push((
                    OrderItem {
                        key,
                        title,
                        quantity: 1,
                        tracking_number: String::new(),
                        status,
                    },
                    numbers,
                ));
            }
        }
    }

    grouped
        .into_iter()
        .map(|(mut item, numbers)| {
            item.tracking_number = numbers.join(", ");
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tqmweb_market::{FixtureMarketplace, FixtureOrder, MarketError, MarketplaceClient, OrderPage};

    fn item(sku: &str, status: &str, tracking: &str) -> RawOrderItem {
        RawOrderItem {
            sku: sku.to_string(),
            name: format!("{} title", sku),
            status: status.to_string(),
            tracking_code: tracking.to_string(),
            ..Default::default()
        }
    }

    fn fixture_order(id: &str, created: &str, statuses: &[&str]) -> FixtureOrder {
        FixtureOrder {
            order: RawOrder {
                order_id: id.to_string(),
                created_at: format!("{} 10:00:00 +0500", created),
                price: "1,000.00".to_string(),
                statuses: statuses.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            items: vec![item("SKU1", "delivered", "")],
            trace: vec![TrackingPackage {
                tracking_number: "TRK-1".to_string(),
            }],
            transactions: vec![],
        }
    }

    fn config(statuses: &[&str]) -> MarketplaceConfig {
        MarketplaceConfig {
            created_after: NaiveDate::from_ymd_opt(2024, 1, 1),
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            page_size: 2,
            ..Default::default()
        }
    }

    struct FailingMarket;

    #[async_trait::async_trait]
    impl MarketplaceClient for FailingMarket {
        async fn list_orders(&self, _query: &OrderQuery) -> Result<OrderPage, MarketError> {
            Err(MarketError::Api {
                code: "IllegalAccessToken".to_string(),
                message: "expired".to_string(),
            })
        }
        async fn order_items(&self, _order_id: &str) -> Result<Vec<RawOrderItem>, MarketError> {
            Ok(vec![])
        }
        async fn order_trace(&self, _order_id: &str) -> Result<Vec<TrackingPackage>, MarketError> {
            Ok(vec![])
        }
        async fn finance_transactions(
            &self,
            _query: &tqmweb_market::FinanceQuery,
        ) -> Result<Vec<tqmweb_market::FinanceRow>, MarketError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_group_items_counts_units() {
        let items = vec![
            item("SKU1", "delivered", "A1"),
            item("SKU1", "delivered", "A2"),
            item("SKU1", "returned", "A3"),
            item("SKU2", "delivered", "A1"),
        ];
        let grouped = group_items(&items, &[]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].key, "SKU1");
        assert_eq!(grouped[0].quantity, 2);
        assert_eq!(grouped[0].tracking_number, "A1, A2");
        assert_eq!(grouped[1].status, "returned");
        assert_eq!(grouped[1].quantity, 1);
    }

    #[test]
    fn test_missing_tracking_comes_from_trace() {
        let trace = vec![TrackingPackage {
            tracking_number: "PKG-9".to_string(),
        }];
        let grouped = group_items(&[item("SKU1", "shipped", "")], &trace);
        assert_eq!(grouped[0].tracking_number, "PKG-9");
    }

    #[test]
    fn test_build_order_fields() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let fixture = fixture_order("42", "2024-02-03", &[]);
        let order = build_order(&fixture.order, &fixture.items, &fixture.trace, today);
        assert_eq!(order.order_id, "42");
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(order.price, Decimal::from(1000));
        assert_eq!(order.statuses, vec!["delivered".to_string()]);
        assert!(order.finance.is_none());
    }

    #[tokio::test]
    async fn test_new_cache_is_not_loaded() {
        let cache = OrderCache::new();
        assert!(!cache.is_loaded());
        assert!(matches!(cache.orders_in(&DateWindow::default()), Err(CoreError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_refresh_paginates_and_dedupes() {
        let market: MarketRef = Arc::new(FixtureMarketplace::from_orders(vec![
            fixture_order("1", "2024-01-05", &["delivered"]),
            fixture_order("2", "2024-01-06", &["delivered"]),
            fixture_order("3", "2024-01-07", &["returned"]),
            fixture_order("4", "2023-12-01", &["delivered"]),
        ]));
        let cache = OrderCache::new();
        let count = cache.refresh(&market, &config(&["delivered", "returned", "Delivered"])).await.unwrap();
        assert_eq!(count, 3);

        let orders = cache.orders_in(&DateWindow::default()).unwrap();
        let ids: Vec<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(orders[0].items[0].tracking_number, "TRK-1");
    }

    #[tokio::test]
    async fn test_refresh_keeps_resolved_finance() {
        let market: MarketRef = Arc::new(FixtureMarketplace::from_orders(vec![fixture_order(
            "1",
            "2024-01-05",
            &["delivered"],
        )]));
        let cache = OrderCache::new();
        cache.refresh(&market, &config(&[])).await.unwrap();
        cache.store_finance("1", &FinanceSummary::not_paid("PKR"));

        cache.refresh(&market, &config(&[])).await.unwrap();
        let orders = cache.orders_in(&DateWindow::default()).unwrap();
        assert!(orders[0].finance.is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_error() {
        let good: MarketRef = Arc::new(FixtureMarketplace::from_orders(vec![fixture_order(
            "1",
            "2024-01-05",
            &["delivered"],
        )]));
        let bad: MarketRef = Arc::new(FailingMarket);
        let cache = OrderCache::new();
        cache.refresh(&good, &config(&[])).await.unwrap();

        assert!(cache.refresh(&bad, &config(&[])).await.is_err());
        assert!(cache.last_error().unwrap().contains("IllegalAccessToken"));
        assert!(matches!(
            cache.orders_in(&DateWindow::default()),
            Err(CoreError::Upstream { .. })
        ));

        cache.refresh(&good, &config(&[])).await.unwrap();
        assert!(cache.last_error().is_none());
        assert_eq!(cache.len(), 1);
    }
}
