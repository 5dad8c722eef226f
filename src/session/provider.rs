use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Event pushed by the wallet provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The active account set changed; an empty list means the wallet was
    /// locked or disconnected externally
    AccountsChanged(Vec<String>),
    /// The wallet switched to a different chain
    ChainChanged(String),
}

/// Failure reported by the wallet provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("the user rejected the connection request")]
    Rejected,
    #[error("{0}")]
    Other(String),
}

/// Contract of the external wallet provider (browser extension or similar).
///
/// The core only consumes this; it never implements a provider. Requesting
/// accounts is the one call that may show the user a permission prompt.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;
    async fn chain_id(&self) -> Result<String, ProviderError>;
    /// Stream of provider-pushed events, delivered in emission order
    fn events(&self) -> mpsc::UnboundedReceiver<ProviderEvent>;
}
