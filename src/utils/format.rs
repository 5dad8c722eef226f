use chrono::{TimeZone, Utc};

/// Format an address for display (shortened)
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[0..6], &address[address.len() - 4..])
}

/// Format an epoch-millisecond timestamp for display
pub fn format_timestamp_ms(millis: u64) -> String {
    match Utc.timestamp_millis_opt(millis as i64).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
