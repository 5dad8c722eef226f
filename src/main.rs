use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

mod api;
mod config;
mod models;
mod session;
mod sync;
mod utils;
mod views;

use crate::api::ApiClient;
use crate::session::WalletSession;
use crate::utils::format_address;
use crate::views::{HistoryView, PoolsView, PriceView};

/// Headless runner for the dashboard synchronization core
#[derive(Parser, Debug)]
#[command(name = "defi-dashboard-sync")]
struct Args {
    /// Token symbol to track
    #[arg(long, default_value = "ETH")]
    token: String,
    /// Wallet address to poll transaction history for
    #[arg(long)]
    address: Option<String>,
    /// Override the API base URL from config
    #[arg(long)]
    api_url: Option<String>,
    /// Seconds between status reports
    #[arg(long, default_value_t = 15)]
    report_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables
    dotenv().ok();

    // Initialize logging
    init_logger();

    let args = Args::parse();

    info!("Starting DeFi dashboard sync core...");

    // Load configuration
    let mut config = config::load_config()?;
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    info!("Configuration loaded, API at {}", config.api_base_url);

    let api = Arc::new(ApiClient::new(&config.api_base_url));

    // Headless environment: no wallet provider is present, so connect()
    // demonstrates the provider-unavailable path.
    let session = WalletSession::spawn(None);
    if let Err(err) = session.connect().await {
        warn!("Wallet connection unavailable: {}", err);
    }

    // Arm the view bindings
    let price = PriceView::new(api.clone(), &config);
    price.activate(&args.token);
    let _price_listener = price.watch_session(&session);
    info!("Tracking {} prices", args.token);

    let pools = PoolsView::new(api.clone(), &config);
    pools.activate();
    let _pools_listener = pools.watch_session(&session);

    let history = HistoryView::new(api.clone(), &config);
    let _history_listener = history.watch_session(&session);
    if let Some(address) = &args.address {
        history.activate(address);
        info!("Tracking transaction history for {}", format_address(address));
    }

    // Report snapshots until shutdown
    let mut report = time::interval(Duration::from_secs(args.report_interval));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = report.tick() => report_snapshots(&args.token, &price, &history, &pools),
            _ = &mut shutdown => break,
        }
    }
    info!("Shutdown signal received");

    price.deactivate();
    history.deactivate();
    pools.deactivate();

    info!("Shutting down...");
    Ok(())
}

fn report_snapshots(
    token: &str,
    price: &PriceView,
    history: &HistoryView,
    pools: &PoolsView,
) {
    let spot = price.spot();
    match (&spot.result, &spot.error) {
        (Some(spot), _) => info!("{} spot price: ${:.2}", token, spot.price),
        (None, Some(err)) => warn!("{} spot price unavailable: {}", token, err),
        (None, None) => info!("{} spot price: waiting for first result", token),
    }

    if let Some(series) = price.history().result {
        info!("{} history: {} points", token, series.len());
    }

    if let Some(page) = history.snapshot().result {
        info!(
            "Transaction history: {} rows (page {} of {})",
            page.transactions.len(),
            history.page().unwrap_or(1),
            page.total_pages
        );
    }

    if let Some(pool_list) = pools.snapshot().result {
        for pool in &pool_list {
            info!("Pool {}: APR {:.1}%, staked {}", pool.name, pool.apr, pool.total_staked);
        }
    }
}

fn init_logger() {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
}
