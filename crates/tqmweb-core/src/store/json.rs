//! JSON-file ledger store
//!
//! `costs.json` holds an object keyed by item key, `payments.json` an array of
//! payments. Both are re-read on every call so hand edits show up without a
//! restart.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{add_vendor_total, sort_newest_first, LedgerStore};
use crate::error::CoreResult;
use crate::models::{CostRecord, PaymentRecord};

/// Ledger store on two JSON files
pub struct JsonFileStore {
    costs_path: PathBuf,
    payments_path: PathBuf,
    /// Held across read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(costs_path: &Path, payments_path: &Path) -> Self {
        Self {
            costs_path: costs_path.to_path_buf(),
            payments_path: payments_path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_costs(&self) -> CoreResult<BTreeMap<String, CostRecord>> {
        read_json(&self.costs_path).await
    }

    async fn read_payments(&self) -> CoreResult<Vec<PaymentRecord>> {
        read_json(&self.payments_path).await
    }
}

/// Missing or blank files read as the empty value
async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> CoreResult<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(T::default()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file and rename over the target
async fn write_json<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load_costs(&self) -> CoreResult<HashMap<String, CostRecord>> {
        Ok(self.read_costs().await?.into_iter().collect())
    }

    async fn upsert_cost(&self, key: &str, record: &CostRecord) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut costs = self.read_costs().await?;
        match costs.get_mut(key) {
            Some(existing) => *existing = record.clone(),
            None => {
                costs.insert(key.to_string(), record.clone());
            }
        }
        write_json(&self.costs_path, &costs).await?;
        log::debug!("Saved cost for {}", key);
        Ok(())
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut payments = self.read_payments().await?;
        payments.push(record.clone());
        write_json(&self.payments_path, &payments).await
    }

    async fn list_payments(&self, user: &str) -> CoreResult<Vec<PaymentRecord>> {
        let mut payments: Vec<PaymentRecord> = self
            .read_payments()
            .await?
            .into_iter()
            .filter(|p| p.user == user)
            .collect();
        sort_newest_first(&mut payments);
        Ok(payments)
    }

    async fn sum_payments_by_vendor(&self) -> CoreResult<BTreeMap<String, Decimal>> {
        let mut totals = BTreeMap::new();
        for payment in self.read_payments().await? {
            add_vendor_total(&mut totals, payment.vendor, payment.amount)?;
        }
        Ok(totals)
    }
}
