//! SQLite-backed ledger store
//!
//! Amounts are kept as decimal TEXT so nothing passes through floating point;
//! totals are summed in Rust.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use super::{add_vendor_total, sort_newest_first, LedgerStore};
use crate::error::{CoreError, CoreResult};
use crate::models::{CostRecord, PaymentRecord};

/// Ledger store on a SQLite pool
pub struct SqlStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct CostRow {
    item_key: String,
    product_cost: String,
    packaging: String,
    vendor: String,
}

#[derive(FromRow)]
struct PaymentRow {
    user_id: String,
    vendor: String,
    amount: String,
    payment_date: String,
    recorded_at: String,
}

#[derive(FromRow)]
struct VendorAmountRow {
    vendor: String,
    amount: String,
}

impl SqlStore {
    /// Connect and create the tables if needed; the database file is created when missing
    pub async fn connect(database_url: &str) -> CoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> CoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS item_costs (
                item_key TEXT PRIMARY KEY,
                product_cost TEXT NOT NULL,
                packaging TEXT NOT NULL,
                vendor TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vendor_payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                vendor TEXT NOT NULL,
                amount TEXT NOT NULL,
                payment_date TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_vendor_payments_user ON vendor_payments(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn decimal_column(text: &str, column: &str) -> CoreResult<Decimal> {
    Decimal::from_str(text.trim()).map_err(|e| CoreError::Storage {
        message: format!("bad {} value '{}': {}", column, text, e),
    })
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> CoreResult<Self> {
        let date = NaiveDate::parse_from_str(&row.payment_date, "%Y-%m-%d").map_err(|e| CoreError::Storage {
            message: format!("bad payment_date '{}': {}", row.payment_date, e),
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| CoreError::Storage {
                message: format!("bad recorded_at '{}': {}", row.recorded_at, e),
            })?;
        Ok(PaymentRecord {
            amount: decimal_column(&row.amount, "amount")?,
            user: row.user_id,
            vendor: row.vendor,
            date,
            timestamp,
        })
    }
}

#[async_trait]
impl LedgerStore for SqlStore {
    async fn load_costs(&self) -> CoreResult<HashMap<String, CostRecord>> {
        let rows: Vec<CostRow> =
            sqlx::query_as("SELECT item_key, product_cost, packaging, vendor FROM item_costs")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                let record = CostRecord {
                    product_cost: decimal_column(&row.product_cost, "product_cost")?,
                    packaging: decimal_column(&row.packaging, "packaging")?,
                    vendor: row.vendor,
                };
                Ok((row.item_key, record))
            })
            .collect()
    }

    async fn upsert_cost(&self, key: &str, record: &CostRecord) -> CoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = sqlx::query(
            "UPDATE item_costs SET product_cost = ?, packaging = ?, vendor = ?, updated_at = ? WHERE item_key = ?",
        )
        .bind(record.product_cost.to_string())
        .bind(record.packaging.to_string())
        .bind(&record.vendor)
        .bind(&now)
        .bind(key)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO item_costs (item_key, product_cost, packaging, vendor, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(key)
            .bind(record.product_cost.to_string())
            .bind(record.packaging.to_string())
            .bind(&record.vendor)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        log::debug!("Saved cost for {}", key);
        Ok(())
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO vendor_payments (user_id, vendor, amount, payment_date, recorded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.user)
        .bind(&record.vendor)
        .bind(record.amount.to_string())
        .bind(record.date.format("%Y-%m-%d").to_string())
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_payments(&self, user: &str) -> CoreResult<Vec<PaymentRecord>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT user_id, vendor, amount, payment_date, recorded_at FROM vendor_payments WHERE user_id = ?",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        let mut payments = rows
            .into_iter()
            .map(PaymentRecord::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        sort_newest_first(&mut payments);
        Ok(payments)
    }

    async fn sum_payments_by_vendor(&self) -> CoreResult<BTreeMap<String, Decimal>> {
        let rows: Vec<VendorAmountRow> = sqlx::query_as("SELECT vendor, amount FROM vendor_payments")
            .fetch_all(&self.pool)
            .await?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let amount = decimal_column(&row.amount, "amount")?;
            add_vendor_total(&mut totals, row.vendor, amount)?;
        }
        Ok(totals)
    }
}
