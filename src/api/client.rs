use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::models::{FarmPool, FarmPools, PricePoint, SpotPrice, TransactionPage};

/// Thin client for the dashboard's JSON-over-HTTP API.
///
/// Issues single GET requests and decodes the body; it never retries and
/// imposes no timeout beyond the transport's own. Retry policy belongs to
/// the pollers built on top of it.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for the given API base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!("GET {}", path);

        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Network(format!(
                "{} returned status {}",
                path, status
            )));
        }

        // Decode from text rather than response.json() so a malformed body
        // is reported as a Decode failure, not a transport one.
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode response from {}: {}", path, e);
            ApiError::Decode(format!("{}: {}", path, e))
        })
    }

    /// Fetch the latest spot price for a token
    pub async fn spot_price(&self, token: &str) -> Result<SpotPrice, ApiError> {
        self.get_json(&format!("/api/prices/{}", token), &[]).await
    }

    /// Fetch the price history series for a token at the given bucket size
    pub async fn price_history(
        &self,
        token: &str,
        bucket: &str,
    ) -> Result<Vec<PricePoint>, ApiError> {
        self.get_json(
            &format!("/api/prices/{}/history", token),
            &[("interval", bucket.to_string())],
        )
        .await
    }

    /// Fetch one page of transaction history for an address
    pub async fn transactions(
        &self,
        address: &str,
        page: u32,
    ) -> Result<TransactionPage, ApiError> {
        self.get_json(
            "/api/transactions",
            &[("address", address.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Fetch the farm pool listing
    pub async fn farm_pools(&self) -> Result<Vec<FarmPool>, ApiError> {
        let listing: FarmPools = self.get_json("/api/farm/pools", &[]).await?;
        Ok(listing.pools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(
            client.url("/api/prices/ETH"),
            "http://localhost:8080/api/prices/ETH"
        );
    }

    #[test]
    fn base_url_without_trailing_slash() {
        let client = ApiClient::new("https://dash.example.com");
        assert_eq!(
            client.url("/api/farm/pools"),
            "https://dash.example.com/api/farm/pools"
        );
    }
}
