//! Core dashboard logic: order cache, finance resolution, costs, payments and stats
//!
//! [`Dashboard`] ties the pieces together for the HTTP layer. Each report
//! call filters the cached orders, resolves any finance summary still
//! missing, reloads costs and payment totals from the store and recomputes
//! the stats from scratch.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tqmweb_config::Config;
use tqmweb_market::MarketRef;

pub mod cache;
pub mod error;
pub mod finance;
pub mod models;
pub mod money;
pub mod reports;
pub mod store;
pub mod time;
pub mod view;

pub use cache::OrderCache;
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger};
pub use finance::FinanceResolver;
pub use models::{CostRecord, FinanceSummary, Order, OrderItem, PaymentRecord};
pub use reports::{DashboardReport, DashboardStats, PaymentEntry, VendorLine};
pub use store::{open_store, LedgerStore, StoreRef};
pub use time::DateWindow;
pub use view::{ItemView, OrderView, ViewBuilder};

use money::{ensure_in_range, format_money, parse_lenient_value, parse_strict_value, round_money};

/// Body of a save-cost request; amounts may be strings or numbers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveCostRequest {
    pub key: String,
    pub product_cost: serde_json::Value,
    pub packaging: serde_json::Value,
    pub vendor: String,
}

/// Body of a record-payment request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPaymentRequest {
    pub vendor: String,
    pub amount: serde_json::Value,
    pub date: String,
}

/// Shared dashboard service
pub struct Dashboard {
    config: Arc<Config>,
    market: MarketRef,
    store: StoreRef,
    cache: OrderCache,
    resolver: FinanceResolver,
}

impl Dashboard {
    pub fn new(config: Arc<Config>, market: MarketRef, store: StoreRef, cache: OrderCache) -> Self {
        let resolver = FinanceResolver::new(
            market.clone(),
            config.marketplace.finance_window_days,
            &config.dashboard.currency,
        );
        Self {
            config,
            market,
            store,
            cache,
            resolver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    /// Re-run order ingestion
    pub async fn refresh(&self) -> CoreResult<usize> {
        self.cache.refresh(&self.market, &self.config.marketplace).await
    }

    /// Orders, stats and form data for one date window
    pub async fn build_report(&self, window: DateWindow) -> CoreResult<DashboardReport> {
        let orders = self.cache.orders_in(&window)?;
        let costs = self.store.load_costs().await?;
        let payments = self.store.sum_payments_by_vendor().await?;

        let currency = self.config.dashboard.currency.as_str();
        let builder = ViewBuilder::new(&costs, currency, &self.config.dashboard.default_vendor);
        let today = Utc::now().date_naive();
        let logger = DefaultErrorLogger;

        let mut views = Vec::with_capacity(orders.len());
        for order in &orders {
            let finance = match &order.finance {
                Some(summary) => summary.clone(),
                None => match self
                    .resolver
                    .resolve(&order.order_id, order.order_date, order.price, today)
                    .await
                {
                    Ok(summary) => {
                        self.cache.store_finance(&order.order_id, &summary);
                        summary
                    }
                    Err(e) => {
                        let context = ErrorContext::new("resolve_finance")
                            .with_data("order_id", serde_json::json!(order.order_id));
                        logger.log_error(&e, &context);
                        FinanceSummary::unavailable(&e.to_string(), currency)
                    }
                },
            };
            views.push(builder.order(order, Some(&finance))?);
        }

        let vendors = self.config.vendor_choices();
        let stats = reports::compute_stats(&views, &payments, &self.config.dashboard.vendors, currency)?;

        Ok(DashboardReport {
            from: window.from_value(),
            to: window.to_value(),
            description: window.description(),
            loaded_at: self.cache.loaded_at().map(|t| t.to_rfc3339()),
            orders: views,
            stats,
            vendors,
            currency: currency.to_string(),
        })
    }

    /// Upsert the cost override for one item key
    pub async fn save_cost(&self, request: &SaveCostRequest) -> CoreResult<CostRecord> {
        let key = request.key.trim();
        if key.is_empty() {
            return Err(CoreError::validation("Missing item key"));
        }

        let vendor = match request.vendor.trim() {
            "" => self.config.dashboard.default_vendor.clone(),
            vendor => vendor.to_string(),
        };
        let product_cost = ensure_in_range(parse_lenient_value(&request.product_cost), "Product cost")?;
        let packaging = ensure_in_range(parse_lenient_value(&request.packaging), "Packaging")?;
        let record = CostRecord {
            product_cost: round_money(product_cost),
            packaging: round_money(packaging),
            vendor,
        };

        self.store.upsert_cost(key, &record).await?;
        log::info!("Cost for {} set to {} + {} ({})", key, record.product_cost, record.packaging, record.vendor);
        Ok(record)
    }

    /// Validate and append a vendor payment for the configured user
    pub async fn record_payment(&self, request: &RecordPaymentRequest) -> CoreResult<PaymentRecord> {
        let vendor = request.vendor.trim();
        if vendor.is_empty() {
            return Err(CoreError::validation("Vendor is required"));
        }

        let amount = round_money(parse_strict_value(&request.amount, "amount")?);
        if amount <= rust_decimal::Decimal::ZERO {
            return Err(CoreError::validation("Amount must be greater than zero"));
        }
        ensure_in_range(amount, "Amount")?;

        let date = time::parse_iso_date(&request.date)
            .ok_or_else(|| CoreError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", request.date)))?;

        let record = PaymentRecord {
            user: self.config.storage.user_id.clone(),
            vendor: vendor.to_string(),
            amount,
            date,
            timestamp: Utc::now(),
        };
        self.store.insert_payment(&record).await?;
        log::info!("Recorded payment of {} to {} on {}", record.amount, record.vendor, record.date);
        Ok(record)
    }

    /// Payments recorded by the configured user, newest first
    pub async fn payment_history(&self) -> CoreResult<Vec<PaymentEntry>> {
        let currency = self.config.dashboard.currency.as_str();
        let payments = self.store.list_payments(&self.config.storage.user_id).await?;
        Ok(payments
            .into_iter()
            .map(|p| PaymentEntry {
                date: p.date.to_string(),
                vendor: p.vendor,
                amount_fmt: format_money(p.amount, currency),
            })
            .collect())
    }
}
