//! Signed HTTP client for the marketplace open platform

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::MarketError;
use crate::types::{lenient_string, FinanceQuery, FinanceRow, OrderPage, OrderQuery, RawOrderItem, TrackingPackage};
use crate::MarketplaceClient;

type HmacSha256 = Hmac<Sha256>;

const ORDERS_PATH: &str = "/orders/get";
const ORDER_ITEMS_PATH: &str = "/order/items/get";
const ORDER_TRACE_PATH: &str = "/logistic/order/trace";
const FINANCE_PATH: &str = "/finance/transaction/details/get";

/// Credentials and endpoint for the open-platform gateway
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub app_key: String,
    pub app_secret: String,
    pub access_token: String,
}

/// Compute the request signature
///
/// HMAC-SHA256 keyed with the app secret over the API path followed by every
/// parameter as `key` + `value` in key order, rendered as uppercase hex.
pub fn sign_request(api_path: &str, params: &BTreeMap<String, String>, app_secret: &str) -> String {
    let mut message = String::from(api_path);
    for (key, value) in params {
        message.push_str(key);
        message.push_str(value);
    }
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "lenient_string")]
    code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TraceResult {
    module: Vec<TraceModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TraceModule {
    package_detail_info_list: Vec<TrackingPackage>,
}

/// Live marketplace client over reqwest
pub struct HttpMarketplaceClient {
    credentials: Credentials,
    client: reqwest::Client,
}

impl HttpMarketplaceClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, MarketError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { credentials, client })
    }

    /// Common parameters plus the signature for one call
    fn signed_params(&self, api_path: &str, mut params: BTreeMap<String, String>) -> BTreeMap<String, String> {
        params.insert("app_key".to_string(), self.credentials.app_key.clone());
        params.insert("access_token".to_string(), self.credentials.access_token.clone());
        params.insert("sign_method".to_string(), "sha256".to_string());
        params.insert("timestamp".to_string(), Utc::now().timestamp_millis().to_string());
        let sign = sign_request(api_path, &params, &self.credentials.app_secret);
        params.insert("sign".to_string(), sign);
        params
    }

    async fn call(&self, api_path: &str, params: BTreeMap<String, String>) -> Result<Envelope, MarketError> {
        let url = format!("{}{}", self.credentials.base_url.trim_end_matches('/'), api_path);
        let params = self.signed_params(api_path, params);

        log::debug!("GET {}", api_path);
        let envelope: Envelope = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.code != "0" {
            return Err(MarketError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    fn decode<T: DeserializeOwned>(api_path: &str, value: serde_json::Value) -> Result<T, MarketError> {
        serde_json::from_value(value).map_err(|e| MarketError::Decode {
            endpoint: api_path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, MarketError> {
        let mut params = BTreeMap::new();
        params.insert("created_after".to_string(), format!("{}T00:00:00+00:00", query.created_after));
        params.insert("sort_by".to_string(), "created_at".to_string());
        params.insert("sort_direction".to_string(), "DESC".to_string());
        params.insert("offset".to_string(), query.offset.to_string());
        params.insert("limit".to_string(), query.limit.to_string());
        if let Some(status) = &query.status {
            params.insert("status".to_string(), status.clone());
        }

        let envelope = self.call(ORDERS_PATH, params).await?;
        if envelope.data.is_null() {
            return Ok(OrderPage::default());
        }
        Self::decode(ORDERS_PATH, envelope.data)
    }

    async fn order_items(&self, order_id: &str) -> Result<Vec<RawOrderItem>, MarketError> {
        let mut params = BTreeMap::new();
        params.insert("order_id".to_string(), order_id.to_string());

        let envelope = self.call(ORDER_ITEMS_PATH, params).await?;
        if envelope.data.is_null() {
            return Ok(Vec::new());
        }
        Self::decode(ORDER_ITEMS_PATH, envelope.data)
    }

    async fn order_trace(&self, order_id: &str) -> Result<Vec<TrackingPackage>, MarketError> {
        let mut params = BTreeMap::new();
        params.insert("order_id".to_string(), order_id.to_string());

        let envelope = self.call(ORDER_TRACE_PATH, params).await?;
        if envelope.result.is_null() {
            return Ok(Vec::new());
        }
        let result: TraceResult = Self::decode(ORDER_TRACE_PATH, envelope.result)?;

        Ok(result
            .module
            .into_iter()
            .flat_map(|m| m.package_detail_info_list)
            .collect())
    }

    async fn finance_transactions(&self, query: &FinanceQuery) -> Result<Vec<FinanceRow>, MarketError> {
        let mut params = BTreeMap::new();
        params.insert("start_time".to_string(), query.start.format("%Y-%m-%d").to_string());
        params.insert("end_time".to_string(), query.end.format("%Y-%m-%d").to_string());
        params.insert("offset".to_string(), query.offset.to_string());
        params.insert("limit".to_string(), query.limit.to_string());
        if let Some(order_id) = &query.order_id {
            params.insert("trade_order_id".to_string(), order_id.clone());
        }

        let envelope = self.call(FINANCE_PATH, params).await?;
        if envelope.data.is_null() {
            return Ok(Vec::new());
        }
        Self::decode(FINANCE_PATH, envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_signature_is_uppercase_hex() {
        let sign = sign_request("/orders/get", &params(&[("app_key", "123"), ("timestamp", "1")]), "secret");
        assert_eq!(sign.len(), 64);
        assert!(sign.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_signature_depends_on_path_params_and_secret() {
        let base = params(&[("app_key", "123"), ("order_id", "42")]);
        let sign = sign_request("/order/items/get", &base, "secret");

        assert_eq!(sign, sign_request("/order/items/get", &base, "secret"));
        assert_ne!(sign, sign_request("/orders/get", &base, "secret"));
        assert_ne!(sign, sign_request("/order/items/get", &base, "other"));
        assert_ne!(sign, sign_request("/order/items/get", &params(&[("app_key", "123"), ("order_id", "43")]), "secret"));
    }

    #[test]
    fn test_envelope_error_code() {
        let envelope: Envelope = serde_json::from_str(r#"{"code":"IllegalAccessToken","message":"expired"}"#).unwrap();
        assert_eq!(envelope.code, "IllegalAccessToken");
        assert!(envelope.data.is_null());

        let envelope: Envelope = serde_json::from_str(r#"{"code":0,"data":[]}"#).unwrap();
        assert_eq!(envelope.code, "0");
    }

    #[test]
    fn test_trace_result_decodes() {
        let result: TraceResult = serde_json::from_value(serde_json::json!({
            "module": [{"package_detail_info_list": [
                {"tracking_number": "DRZ123", "logistic_detail_info_list": [{"title": "Shipped"}, {"title": "Delivered"}]},
                {"tracking_number": 4455}
            ]}]
        }))
        .unwrap();
        assert_eq!(result.module[0].package_detail_info_list[0].tracking_number, "DRZ123");
        assert_eq!(result.module[0].package_detail_info_list[1].tracking_number, "4455");
    }
}
