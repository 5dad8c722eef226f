use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::FarmPool;
use crate::session::{SessionEvent, WalletSession};
use crate::sync::{Fetch, PollSchedule, PollSnapshot, Poller};

struct FarmPoolsFetch {
    api: Arc<ApiClient>,
}

#[async_trait]
impl Fetch<(), Vec<FarmPool>> for FarmPoolsFetch {
    async fn fetch(&self, _subject: &()) -> Result<Vec<FarmPool>, ApiError> {
        self.api.farm_pools().await
    }
}

/// Farm panel binding: polls the pool listing, which has no subject
pub struct PoolsView {
    poller: Mutex<Poller<(), Vec<FarmPool>>>,
}

impl PoolsView {
    pub fn new(api: Arc<ApiClient>, config: &Config) -> Arc<Self> {
        Self::with_fetcher(
            Arc::new(FarmPoolsFetch { api }),
            PollSchedule::immediate(Duration::from_secs(config.pools_interval_secs)),
        )
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn Fetch<(), Vec<FarmPool>>>,
        schedule: PollSchedule,
    ) -> Arc<Self> {
        Arc::new(Self {
            poller: Mutex::new(Poller::new(fetcher, schedule)),
        })
    }

    pub fn activate(&self) {
        self.poller.lock().unwrap().activate(());
    }

    /// Re-arm the poll, discarding in-flight work
    pub fn rearm(&self) {
        let mut poller = self.poller.lock().unwrap();
        if poller.is_active() {
            poller.reconfigure(());
        }
    }

    pub fn deactivate(&self) {
        self.poller.lock().unwrap().deactivate();
    }

    pub fn snapshot(&self) -> PollSnapshot<Vec<FarmPool>> {
        self.poller.lock().unwrap().snapshot()
    }

    /// React to session events: a chain switch re-arms the poll
    pub fn watch_session(self: &Arc<Self>, session: &WalletSession) -> JoinHandle<()> {
        super::spawn_session_listener(self, session, |view, event| {
            if let SessionEvent::HardReset(_) = event {
                view.rearm();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    struct CountingFetch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch<(), Vec<FarmPool>> for CountingFetch {
        async fn fetch(&self, _subject: &()) -> Result<Vec<FarmPool>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FarmPool {
                id: 1,
                name: "ETH-USDC".to_string(),
                apr: 14.2,
                total_staked: "1204000.55".to_string(),
                user_stake: "0".to_string(),
                pending_rewards: "0".to_string(),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_refetches_with_a_new_generation() {
        let fetch = Arc::new(CountingFetch {
            calls: AtomicUsize::new(0),
        });
        let view = PoolsView::with_fetcher(
            fetch.clone(),
            PollSchedule::immediate(Duration::from_secs(120)),
        );
        view.activate();
        sleep(Duration::from_millis(10)).await;
        let first = view.snapshot();
        assert!(first.result.is_some());

        view.rearm();
        sleep(Duration::from_millis(10)).await;
        let second = view.snapshot();
        assert!(second.generation > first.generation);
        assert!(second.result.is_some());
        assert!(fetch.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_before_activation_does_not_start_polling() {
        let fetch = Arc::new(CountingFetch {
            calls: AtomicUsize::new(0),
        });
        let view = PoolsView::with_fetcher(
            fetch.clone(),
            PollSchedule::immediate(Duration::from_secs(120)),
        );
        view.rearm();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 0);
    }
}
