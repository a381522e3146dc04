//! tqmweb main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tqmweb_api::{start_server, AppState};
use tqmweb_config::Config;
use tqmweb_core::{open_store, Dashboard, OrderCache};
use tqmweb_market::{Credentials, FixtureMarketplace, HttpMarketplaceClient, MarketRef};

#[derive(Parser, Debug)]
#[command(name = "tqmweb")]
#[command(version = "0.1.0")]
#[command(about = "Order profit and vendor payables dashboard for marketplace sellers", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print a default configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration from {}", args.config.display());
            eprintln!("{}", e.to_details());
            return Err(e.into());
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    log::info!("Config loaded from {}", args.config.display());

    let rt = Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);

    // Startup failures are served as error pages rather than ending the process
    let state = match build_dashboard(config.clone()).await {
        Ok(dashboard) => {
            match dashboard.refresh().await {
                Ok(count) => log::info!("Loaded {} orders", count),
                Err(e) => log::error!("Initial order ingestion failed: {}", e),
            }
            AppState::Ready(Arc::new(dashboard))
        }
        Err(e) => {
            log::error!("Dashboard failed to start: {:#}", e);
            AppState::failed(config.clone(), format!("{:#}", e))
        }
    };

    start_server(&config.server.host, config.server.port, state).await
}

async fn build_dashboard(config: Arc<Config>) -> anyhow::Result<Dashboard> {
    let market = build_market(&config).await?;
    let store = open_store(&config.storage)
        .await
        .context("Failed to open the cost/payment store")?;
    Ok(Dashboard::new(config, market, store, OrderCache::new()))
}

async fn build_market(config: &Config) -> anyhow::Result<MarketRef> {
    let marketplace = &config.marketplace;
    if let Some(path) = &marketplace.fixture_path {
        let fixture = FixtureMarketplace::from_file(path)
            .await
            .with_context(|| format!("Failed to load fixture orders from {}", path.display()))?;
        return Ok(Arc::new(fixture));
    }

    let credentials = Credentials {
        base_url: marketplace.base_url.clone(),
        app_key: marketplace.app_key.clone(),
        app_secret: marketplace.app_secret.clone(),
        access_token: marketplace.access_token.clone(),
    };
    let client = HttpMarketplaceClient::new(credentials, Duration::from_secs(marketplace.timeout_secs))?;
    log::info!("Using marketplace API at {}", marketplace.base_url);
    Ok(Arc::new(client))
}
