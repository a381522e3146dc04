//! HTTP server for the order profit and vendor payables dashboard
//!
//! Routes are organized into modules:
//! - routes::dashboard: the dashboard page, JSON report, ingestion refresh
//! - routes::costs: item cost overrides
//! - routes::payments: vendor payments and history

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::fmt::Display;
use std::sync::Arc;
use tokio::net::TcpListener;
use tqmweb_config::Config;
use tqmweb_core::Dashboard;
use tqmweb_utils::escape_html;

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub enum AppState {
    Ready(Arc<Dashboard>),
    /// The store or marketplace could not be opened; every data route reports `error`
    Failed { config: Arc<Config>, error: Arc<String> },
}

impl AppState {
    pub fn failed(config: Arc<Config>, error: impl Display) -> Self {
        AppState::Failed {
            config,
            error: Arc::new(error.to_string()),
        }
    }

    pub fn config(&self) -> &Config {
        match self {
            AppState::Ready(dashboard) => dashboard.config(),
            AppState::Failed { config, .. } => config.as_ref(),
        }
    }

    /// The running dashboard, or a 502 carrying the startup failure
    pub fn dashboard(&self) -> ApiResult<&Dashboard> {
        match self {
            AppState::Ready(dashboard) => Ok(dashboard.as_ref()),
            AppState::Failed { error, .. } => Err(ApiError::Upstream {
                message: format!("Dashboard failed to start: {}", error),
            }),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::costs::api_save_cost;
    use routes::dashboard::{api_refresh, api_report, page_dashboard};
    use routes::payments::{api_get_payments, api_record_payment};

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/save_cost", post(api_save_cost))
        .route("/api/record_payment", post(api_record_payment))
        .route("/api/get_payments", get(api_get_payments))
        .route("/api/report", get(api_report))
        .route("/api/refresh", post(api_refresh))
        // Page routes
        .route("/", get(page_dashboard))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap" rel="stylesheet">
    <style>
        body {{ font-family: 'Inter', sans-serif; background-color: #f7f9fb; }}
        .card {{ transition: all 0.3s ease; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1); }}
        .card:hover {{ box-shadow: 0 10px 15px -3px rgba(0, 0, 0, 0.1); transform: translateY(-2px); }}
        .row {{ display: flex; justify-content: space-between; align-items: center; padding: 4px 0; border-bottom: 1px dashed #e5e7eb; }}
        .row:last-child {{ border-bottom: none; }}
        .modal-overlay {{ background-color: rgba(0, 0, 0, 0.5); z-index: 50; }}
        .modal-content {{ max-height: 80vh; max-width: 90vw; }}
        .data-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 1rem; }}
        .data-grid > div {{ background: white; padding: 1rem; border-radius: 0.5rem; }}
    </style>
</head>
<body class="p-4 sm:p-8">
    {}
</body>
</html>"#,
        escape_html(title),
        content
    )
}

/// Full-page error shown when orders could not be loaded
pub fn error_page(title: &str, message: &str) -> String {
    let content = format!(
        r#"<div class="max-w-xl mx-auto mt-16 bg-white rounded-xl shadow-lg p-8">
    <h1 class="text-2xl font-bold text-red-700 mb-4">Dashboard unavailable</h1>
    <p class="text-gray-700 mb-4">Orders or the cost ledger could not be loaded.</p>
    <pre class="text-sm bg-red-50 text-red-800 p-3 rounded whitespace-pre-wrap">{}</pre>
    <button onclick="fetch('/api/refresh', {{method: 'POST'}}).then(() => window.location.reload())"
            class="mt-6 px-4 py-2 bg-indigo-600 text-white font-semibold rounded-md hover:bg-indigo-700">Retry</button>
</div>"#,
        escape_html(message)
    );
    base_html(title, &content)
}

/// Bind and serve until the process is stopped
pub async fn start_server(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting tqmweb server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Dashboard)");
    log::info!("  - /api/save_cost, /api/record_payment, /api/get_payments");
    log::info!("  - /api/report, /api/refresh, /api/health");

    axum::serve(listener, router).await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tqmweb_config::{Config, StorageBackend, StorageConfig};
    use tqmweb_core::{open_store, OrderCache};
    use tqmweb_market::{FinanceRow, FixtureMarketplace, FixtureOrder, MarketRef, RawOrder, RawOrderItem};

    fn fixture() -> Vec<FixtureOrder> {
        vec![FixtureOrder {
            order: RawOrder {
                order_id: "1001".to_string(),
                created_at: "2024-01-10 12:00:00 +0500".to_string(),
                price: "1000".to_string(),
                statuses: vec!["delivered".to_string()],
                ..Default::default()
            },
            items: vec![RawOrderItem {
                sku: "SKU1".to_string(),
                name: "Canvas Tote".to_string(),
                status: "delivered".to_string(),
                tracking_code: "TRK1".to_string(),
                ..Default::default()
            }],
            trace: vec![],
            transactions: vec![FinanceRow {
                order_no: "1001".to_string(),
                fee_name: "Shipping Fee".to_string(),
                amount: "-50".to_string(),
                transaction_date: "2024-01-12".to_string(),
                ..Default::default()
            }],
        }]
    }

    async fn app(dir: &tempfile::TempDir, loaded: bool) -> Router {
        let mut config = Config::default();
        config.marketplace.created_after = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
        config.storage = StorageConfig {
            backend: StorageBackend::Json,
            costs_file: dir.path().join("costs.json"),
            payments_file: dir.path().join("payments.json"),
            ..Default::default()
        };
        let config = Arc::new(config);
        let market: MarketRef = Arc::new(FixtureMarketplace::from_orders(fixture()));
        let store = open_store(&config.storage).await.unwrap();
        let dashboard = Dashboard::new(config, market, store, OrderCache::new());
        if loaded {
            dashboard.refresh().await.unwrap();
        }
        create_router(AppState::Ready(Arc::new(dashboard)))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true).await;
        let (status, body) = send(&app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_dashboard_page_renders_orders() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true).await;
        let (status, body) = send(&app, get_request("/?from=2024-01-01&to=2024-12-31")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 Orders Found"));
        assert!(body.contains("PKR 950.00"));
        assert!(body.contains("Not Paid"));
    }

    #[tokio::test]
    async fn test_unloaded_cache_is_502_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false).await;
        let (status, body) = send(&app, get_request("/")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Dashboard unavailable"));
    }

    #[tokio::test]
    async fn test_save_cost_then_report() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/save_cost",
                r#"{"key": "SKU1", "product_cost": "200", "packaging": "30", "vendor": "Tick Bags"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"ok": true}));

        let (status, body) = send(&app, get_request("/api/report")).await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_str(&body).unwrap();
        let item = &report["orders"][0]["items_list"][0];
        assert_eq!(item["needs_cost"], json!(false));
        assert_eq!(item["vendor"], json!("Tick Bags"));
    }

    #[tokio::test]
    async fn test_save_cost_rejects_empty_key_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true).await;

        let (status, body) = send(&app, post_json("/api/save_cost", r#"{"key": "  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["ok"], json!(false));

        let (status, body) = send(&app, post_json("/api/save_cost", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_record_payment_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true).await;

        let (status, body) = send(
            &app,
            post_json("/api/record_payment", r#"{"vendor": "Tick Bags", "amount": 0, "date": "2024-02-01"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"], json!("Amount must be greater than zero"));

        let (status, _) = send(
            &app,
            post_json("/api/record_payment", r#"{"vendor": "Tick Bags", "amount": 1500, "date": "2024-02-01"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get_request("/api/get_payments")).await;
        assert_eq!(status, StatusCode::OK);
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            response,
            json!({"ok": true, "history": [{"date": "2024-02-01", "vendor": "Tick Bags", "amount_fmt": "PKR 1,500.00"}]})
        );
    }

    #[tokio::test]
    async fn test_refresh_loads_orders() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false).await;
        let (status, body) = send(&app, post_json("/api/refresh", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"ok": true, "orders": 1}));

        let (status, _) = send(&app, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failed_startup_still_serves_errors() {
        let state = AppState::failed(
            Arc::new(Config::default()),
            "Failed to open the cost/payment store: unable to open database file",
        );
        let app = create_router(state);

        let (status, body) = send(&app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let (status, body) = send(&app, get_request("/")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Dashboard unavailable"));
        assert!(body.contains("unable to open database file"));

        let (status, body) = send(&app, get_request("/api/report")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["ok"], json!(false));
        assert!(response["error"].as_str().unwrap().starts_with("Dashboard failed to start"));

        let (status, _) = send(
            &app,
            post_json("/api/record_payment", r#"{"vendor": "Tick Bags", "amount": 10, "date": "2024-02-01"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = send(&app, post_json("/api/refresh", "")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
