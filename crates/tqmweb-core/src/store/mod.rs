//! Cost override and vendor payment persistence

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tqmweb_config::{StorageBackend, StorageConfig};

use crate::error::CoreResult;
use crate::models::{CostRecord, PaymentRecord};

pub mod json;
pub mod sql;

pub use json::JsonFileStore;
pub use sql::SqlStore;

/// Store reference type
pub type StoreRef = Arc<dyn LedgerStore>;

/// Trait for cost and payment storage backends
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All cost overrides keyed by item key
    async fn load_costs(&self) -> CoreResult<HashMap<String, CostRecord>>;

    /// Update the record for `key`, inserting it when none exists
    async fn upsert_cost(&self, key: &str, record: &CostRecord) -> CoreResult<()>;

    /// Append a payment
    async fn insert_payment(&self, record: &PaymentRecord) -> CoreResult<()>;

    /// Payments recorded by `user`, newest first
    async fn list_payments(&self, user: &str) -> CoreResult<Vec<PaymentRecord>>;

    /// Payment totals per vendor across all users
    async fn sum_payments_by_vendor(&self) -> CoreResult<BTreeMap<String, rust_decimal::Decimal>>;
}

/// Open the configured backend
pub async fn open_store(config: &StorageConfig) -> CoreResult<StoreRef> {
    match config.backend {
        StorageBackend::Sql => {
            let store = SqlStore::connect(&config.database_url).await?;
            log::info!("Using SQL store at {}", config.database_url);
            Ok(Arc::new(store))
        }
        StorageBackend::Json => {
            let store = JsonFileStore::new(&config.costs_file, &config.payments_file);
            log::info!(
                "Using JSON store ({}, {})",
                config.costs_file.display(),
                config.payments_file.display()
            );
            Ok(Arc::new(store))
        }
    }
}

/// Newest first: payment date, then recording time
pub(crate) fn sort_newest_first(payments: &mut [PaymentRecord]) {
    payments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.timestamp.cmp(&a.timestamp)));
}

/// Add `amount` to the vendor's running total
pub(crate) fn add_vendor_total(
    totals: &mut BTreeMap<String, rust_decimal::Decimal>,
    vendor: String,
    amount: rust_decimal::Decimal,
) -> CoreResult<()> {
    let total = totals.entry(vendor).or_insert(rust_decimal::Decimal::ZERO);
    *total = total.checked_add(amount).ok_or_else(crate::money::overflow)?;
    Ok(())
}
