pub mod manager;
pub mod provider;
pub mod state;

pub use manager::SessionError;
pub use manager::WalletSession;
pub use provider::ProviderError;
pub use provider::ProviderEvent;
pub use provider::WalletProvider;
pub use state::SessionEvent;
pub use state::SessionSnapshot;
pub use state::SessionStatus;
