use thiserror::Error;

/// Failure from the remote data client.
///
/// Both kinds are non-fatal to a polling loop; the distinction exists so
/// transport problems and schema drift stay distinguishable in logs. The
/// rendered message is carried instead of the source error so snapshots
/// handed to consumers stay cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, status, body read)
    #[error("network error: {0}")]
    Network(String),
    /// The body was not JSON or did not match the expected schema
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }
}
