use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::env;

/// Configuration for the dashboard synchronization core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the dashboard HTTP API
    pub api_base_url: String,
    /// How often to refresh the spot price (in seconds)
    pub spot_price_interval_secs: u64,
    /// How often to refresh the price history series (in seconds)
    pub price_history_interval_secs: u64,
    /// Bucket size requested for price history (e.g. "1h")
    pub price_history_bucket: String,
    /// How often to refresh the transaction history page (in seconds)
    pub transactions_interval_secs: u64,
    /// How often to refresh the farm pool listing (in seconds)
    pub pools_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            spot_price_interval_secs: 30,
            price_history_interval_secs: 300, // 5 minutes
            price_history_bucket: "1h".to_string(),
            transactions_interval_secs: 60,
            pools_interval_secs: 120,
        }
    }
}

/// Loads configuration from environment variables, falling back to default values
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    // Load values from environment variables if available
    if let Ok(base_url) = env::var("API_BASE_URL") {
        config.api_base_url = base_url;
    }

    if let Ok(interval) = env::var("SPOT_PRICE_INTERVAL_SECS") {
        if let Ok(value) = interval.parse::<u64>() {
            config.spot_price_interval_secs = value;
        }
    }

    if let Ok(interval) = env::var("PRICE_HISTORY_INTERVAL_SECS") {
        if let Ok(value) = interval.parse::<u64>() {
            config.price_history_interval_secs = value;
        }
    }

    if let Ok(bucket) = env::var("PRICE_HISTORY_BUCKET") {
        config.price_history_bucket = bucket;
    }

    if let Ok(interval) = env::var("TRANSACTIONS_INTERVAL_SECS") {
        if let Ok(value) = interval.parse::<u64>() {
            config.transactions_interval_secs = value;
        }
    }

    if let Ok(interval) = env::var("POOLS_INTERVAL_SECS") {
        if let Ok(value) = interval.parse::<u64>() {
            config.pools_interval_secs = value;
        }
    }

    Ok(config)
}
