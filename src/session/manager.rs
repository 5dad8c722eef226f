use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::session::provider::{ProviderError, ProviderEvent, WalletProvider};
use crate::session::state::{SessionEvent, SessionSnapshot, SessionStatus};

/// Failure from a session operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no wallet provider is available; install a wallet extension to connect")]
    ProviderUnavailable,
    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),
    #[error("already connected")]
    AlreadyConnected,
    #[error("a connection attempt is already in progress")]
    ConnectionInProgress,
    #[error("wallet provider error: {0}")]
    Provider(String),
    #[error("session loop is no longer running")]
    Closed,
}

enum Command {
    Connect {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    Disconnect,
    Subscribe {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<SessionEvent>>,
    },
}

/// Handle to the wallet session.
///
/// The session state lives in a single loop task; this handle sends it
/// commands and reads published snapshots. All mutation is serialized
/// through the loop, so two `connect` calls can never run their provider
/// prompts concurrently. Cloning the handle shares the same session.
#[derive(Clone)]
pub struct WalletSession {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl WalletSession {
    /// Spawn the session loop. `provider` is `None` in environments with no
    /// wallet installed; `connect` then fails with `ProviderUnavailable`.
    pub fn spawn(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let events = provider.as_ref().map(|p| p.events());
        let session_loop = SessionLoop {
            provider,
            state: SessionSnapshot::default(),
            snapshots: snapshot_tx,
            subscribers: Vec::new(),
        };
        tokio::spawn(session_loop.run(command_rx, events));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
        }
    }

    /// Request wallet access. Valid from `Disconnected` or `Error`; the one
    /// path that may show the user a permission prompt.
    pub async fn connect(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Connect { reply })
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    /// Reset the session to `Disconnected`
    pub fn disconnect(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Disconnect)
            .map_err(|_| SessionError::Closed)
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to session events: one per state transition, in order,
    /// none dropped
    pub async fn subscribe(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<SessionEvent>, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Subscribe { reply })
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }
}

struct SessionLoop {
    provider: Option<Arc<dyn WalletProvider>>,
    state: SessionSnapshot,
    snapshots: watch::Sender<SessionSnapshot>,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: Option<mpsc::UnboundedReceiver<ProviderEvent>>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = recv_event(&mut events) => match event {
                    Some(event) => self.handle_provider_event(event),
                    None => events = None,
                },
            }
        }
        debug!("Session loop finished");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { reply } => {
                let result = self.connect().await;
                let _ = reply.send(result);
            }
            Command::Disconnect => {
                info!("Wallet session disconnected");
                self.state = SessionSnapshot::default();
                self.publish(SessionEvent::Updated);
            }
            Command::Subscribe { reply } => {
                let (event_tx, event_rx) = mpsc::unbounded_channel();
                self.subscribers.push(event_tx);
                let _ = reply.send(event_rx);
            }
        }
    }

    async fn connect(&mut self) -> Result<SessionSnapshot, SessionError> {
        match self.state.status {
            SessionStatus::Connected => return Err(SessionError::AlreadyConnected),
            SessionStatus::Connecting => return Err(SessionError::ConnectionInProgress),
            SessionStatus::Disconnected | SessionStatus::Error => {}
        }

        let Some(provider) = self.provider.clone() else {
            warn!("Connect requested but no wallet provider is available");
            return Err(SessionError::ProviderUnavailable);
        };

        self.state = SessionSnapshot {
            status: SessionStatus::Connecting,
            account: None,
            chain_id: None,
            error: None,
        };
        self.publish(SessionEvent::Updated);

        // Provider calls run inside the loop, keeping transitions serialized.
        let outcome = Self::request_identity(provider).await;
        match outcome {
            Ok((account, chain_id)) => {
                info!("Wallet connected: {} on chain {}", account, chain_id);
                // Account and chain become visible in the same update.
                self.state = SessionSnapshot {
                    status: SessionStatus::Connected,
                    account: Some(account),
                    chain_id: Some(chain_id),
                    error: None,
                };
                self.publish(SessionEvent::Updated);
                Ok(self.state.clone())
            }
            Err(err) => {
                warn!("Wallet connection failed: {}", err);
                self.state = SessionSnapshot {
                    status: SessionStatus::Error,
                    account: None,
                    chain_id: None,
                    error: Some(err.to_string()),
                };
                self.publish(SessionEvent::Updated);
                Err(err)
            }
        }
    }

    async fn request_identity(
        provider: Arc<dyn WalletProvider>,
    ) -> Result<(String, String), SessionError> {
        let accounts = provider
            .request_accounts()
            .await
            .map_err(map_provider_error)?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::ConnectionRejected("provider returned no accounts".to_string()))?;
        let chain_id = provider.chain_id().await.map_err(map_provider_error)?;
        Ok((account, chain_id))
    }

    fn handle_provider_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => {
                    info!("Wallet locked or disconnected externally");
                    self.state = SessionSnapshot::default();
                    self.publish(SessionEvent::Updated);
                }
                Some(account) if self.state.is_connected() => {
                    info!("Active account changed to {}", account);
                    self.state.account = Some(account);
                    self.publish(SessionEvent::Updated);
                }
                Some(account) => {
                    debug!("Ignoring account change to {} while not connected", account);
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                if self.state.is_connected() {
                    info!("Chain changed to {}; resetting downstream subscriptions", chain_id);
                    self.state.chain_id = Some(chain_id);
                    self.publish(SessionEvent::HardReset);
                } else {
                    debug!("Ignoring chain change to {} while not connected", chain_id);
                }
            }
        }
    }

    fn publish(&mut self, wrap: fn(SessionSnapshot) -> SessionEvent) {
        let snapshot = self.state.clone();
        let _ = self.snapshots.send(snapshot.clone());
        self.subscribers
            .retain(|subscriber| subscriber.send(wrap(snapshot.clone())).is_ok());
    }
}

async fn recv_event(
    events: &mut Option<mpsc::UnboundedReceiver<ProviderEvent>>,
) -> Option<ProviderEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

fn map_provider_error(err: ProviderError) -> SessionError {
    match err {
        ProviderError::Rejected => SessionError::ConnectionRejected(err.to_string()),
        ProviderError::Other(message) => SessionError::Provider(message),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockProvider;
    use super::*;

    #[tokio::test]
    async fn connect_without_provider_is_rejected() {
        let session = WalletSession::spawn(None);

        let err = session.connect().await.unwrap_err();
        assert_eq!(err, SessionError::ProviderUnavailable);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Disconnected);
        assert_eq!(snapshot.account, None);
        assert_eq!(snapshot.chain_id, None);
    }

    #[tokio::test]
    async fn connect_publishes_account_and_chain_together() {
        let (provider, _events) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let mut events = session.subscribe().await.unwrap();

        let snapshot = session.connect().await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Connected);
        assert_eq!(snapshot.account.as_deref(), Some("0xABC"));
        assert_eq!(snapshot.chain_id.as_deref(), Some("0x1"));

        // One event per transition, in order, each respecting the
        // both-or-neither account/chain invariant.
        let connecting = events.recv().await.unwrap();
        assert_eq!(connecting.snapshot().status, SessionStatus::Connecting);
        assert_eq!(connecting.snapshot().account, None);
        assert_eq!(connecting.snapshot().chain_id, None);

        let connected = events.recv().await.unwrap();
        assert_eq!(connected.snapshot().status, SessionStatus::Connected);
        assert!(connected.snapshot().account.is_some());
        assert!(connected.snapshot().chain_id.is_some());
    }

    #[tokio::test]
    async fn rejected_connection_is_retryable() {
        let (provider, _events) = MockProvider::new();
        provider.script_accounts(Err(ProviderError::Rejected));
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectionRejected(_)));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Error);
        assert_eq!(snapshot.account, None);
        assert_eq!(snapshot.chain_id, None);
        assert!(snapshot.error.is_some());

        let snapshot = session.connect().await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn second_connect_after_success_is_rejected() {
        let (provider, _events) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        session.connect().await.unwrap();

        let err = session.connect().await.unwrap_err();
        assert_eq!(err, SessionError::AlreadyConnected);
    }

    #[tokio::test]
    async fn account_change_keeps_chain() {
        let (provider, events_tx) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let mut events = session.subscribe().await.unwrap();
        session.connect().await.unwrap();
        events.recv().await.unwrap(); // Connecting
        events.recv().await.unwrap(); // Connected

        events_tx
            .send(ProviderEvent::AccountsChanged(vec!["0xDEF".to_string()]))
            .unwrap();

        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::Updated(_)));
        let snapshot = event.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Connected);
        assert_eq!(snapshot.account.as_deref(), Some("0xDEF"));
        assert_eq!(snapshot.chain_id.as_deref(), Some("0x1"));
    }

    #[tokio::test]
    async fn empty_account_list_disconnects() {
        let (provider, events_tx) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let mut events = session.subscribe().await.unwrap();
        session.connect().await.unwrap();
        events.recv().await.unwrap();
        events.recv().await.unwrap();

        events_tx
            .send(ProviderEvent::AccountsChanged(Vec::new()))
            .unwrap();

        let event = events.recv().await.unwrap();
        let snapshot = event.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Disconnected);
        assert_eq!(snapshot.account, None);
        assert_eq!(snapshot.chain_id, None);
    }

    #[tokio::test]
    async fn chain_change_emits_hard_reset() {
        let (provider, events_tx) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let mut events = session.subscribe().await.unwrap();
        session.connect().await.unwrap();
        events.recv().await.unwrap();
        events.recv().await.unwrap();

        events_tx
            .send(ProviderEvent::ChainChanged("0x89".to_string()))
            .unwrap();

        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::HardReset(_)));
        let snapshot = event.snapshot();
        assert_eq!(snapshot.chain_id.as_deref(), Some("0x89"));
        assert_eq!(snapshot.account.as_deref(), Some("0xABC"));
    }

    #[tokio::test]
    async fn provider_events_apply_in_emission_order() {
        let (provider, events_tx) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let mut events = session.subscribe().await.unwrap();
        session.connect().await.unwrap();
        events.recv().await.unwrap();
        events.recv().await.unwrap();

        events_tx
            .send(ProviderEvent::AccountsChanged(vec!["0xDEF".to_string()]))
            .unwrap();
        events_tx
            .send(ProviderEvent::ChainChanged("0x89".to_string()))
            .unwrap();
        events_tx
            .send(ProviderEvent::AccountsChanged(vec!["0x123".to_string()]))
            .unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.snapshot().account.as_deref(), Some("0xDEF"));
        let second = events.recv().await.unwrap();
        assert!(matches!(second, SessionEvent::HardReset(_)));
        assert_eq!(second.snapshot().chain_id.as_deref(), Some("0x89"));
        let third = events.recv().await.unwrap();
        assert_eq!(third.snapshot().account.as_deref(), Some("0x123"));
    }
}
