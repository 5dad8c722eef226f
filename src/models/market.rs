use serde::{Deserialize, Serialize};
use chrono::{DateTime, TimeZone, Utc};

/// Latest spot price for a token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPrice {
    pub price: f64,
}

/// A single point in a token's price history series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Sample time in milliseconds since the Unix epoch
    pub timestamp: u64,
    pub price: f64,
}

impl PricePoint {
    /// The sample time as a UTC datetime, if the timestamp is representable
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp as i64).single()
    }
}
