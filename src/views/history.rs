use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::TransactionPage;
use crate::session::{SessionEvent, WalletSession};
use crate::sync::{Fetch, PollSchedule, PollSnapshot, Poller};

/// What a transaction-history poll is keyed on. A page change is a subject
/// change: the old page's in-flight fetch gets discarded, never applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySubject {
    pub address: String,
    pub page: u32,
}

struct TransactionPageFetch {
    api: Arc<ApiClient>,
}

#[async_trait]
impl Fetch<HistorySubject, TransactionPage> for TransactionPageFetch {
    async fn fetch(&self, subject: &HistorySubject) -> Result<TransactionPage, ApiError> {
        self.api.transactions(&subject.address, subject.page).await
    }
}

/// Transaction-history panel binding, polling one page for one address
pub struct HistoryView {
    subject: Mutex<Option<HistorySubject>>,
    poller: Mutex<Poller<HistorySubject, TransactionPage>>,
}

impl HistoryView {
    pub fn new(api: Arc<ApiClient>, config: &Config) -> Arc<Self> {
        Self::with_fetcher(
            Arc::new(TransactionPageFetch { api }),
            PollSchedule::immediate(Duration::from_secs(config.transactions_interval_secs)),
        )
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn Fetch<HistorySubject, TransactionPage>>,
        schedule: PollSchedule,
    ) -> Arc<Self> {
        Arc::new(Self {
            subject: Mutex::new(None),
            poller: Mutex::new(Poller::new(fetcher, schedule)),
        })
    }

    /// Begin polling page 1 for `address`
    pub fn activate(&self, address: &str) {
        self.apply_subject(HistorySubject {
            address: address.to_string(),
            page: 1,
        });
    }

    /// Jump to another page of the current address
    pub fn set_page(&self, page: u32) {
        let current = self.subject.lock().unwrap().clone();
        if let Some(subject) = current {
            self.apply_subject(HistorySubject {
                address: subject.address,
                page,
            });
        }
    }

    /// Switch to a different address, back at page 1
    pub fn set_address(&self, address: &str) {
        self.activate(address);
    }

    fn apply_subject(&self, subject: HistorySubject) {
        *self.subject.lock().unwrap() = Some(subject.clone());
        self.poller.lock().unwrap().reconfigure(subject);
    }

    /// Re-arm the poll for the current subject, discarding in-flight work
    pub fn rearm(&self) {
        let subject = self.subject.lock().unwrap().clone();
        if let Some(subject) = subject {
            self.poller.lock().unwrap().reconfigure(subject);
        }
    }

    pub fn deactivate(&self) {
        *self.subject.lock().unwrap() = None;
        self.poller.lock().unwrap().deactivate();
    }

    pub fn page(&self) -> Option<u32> {
        self.subject.lock().unwrap().as_ref().map(|s| s.page)
    }

    pub fn snapshot(&self) -> PollSnapshot<TransactionPage> {
        self.poller.lock().unwrap().snapshot()
    }

    /// Follow the session: poll the active account's history, re-arm on a
    /// chain switch, stop when the wallet disconnects
    pub fn watch_session(self: &Arc<Self>, session: &WalletSession) -> JoinHandle<()> {
        super::spawn_session_listener(self, session, |view, event| match event {
            SessionEvent::Updated(snapshot) => {
                view.sync_to_account(snapshot.account.as_deref(), false)
            }
            SessionEvent::HardReset(snapshot) => {
                view.sync_to_account(snapshot.account.as_deref(), true)
            }
        })
    }

    fn sync_to_account(&self, account: Option<&str>, force_rearm: bool) {
        match account {
            None => self.deactivate(),
            Some(account) => {
                let current = self.subject.lock().unwrap().clone();
                match current {
                    Some(subject) if subject.address == account => {
                        if force_rearm {
                            self.rearm();
                        }
                    }
                    _ => self.activate(account),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::manager::testing::MockProvider;
    use crate::session::ProviderEvent;
    use tokio::time::sleep;

    /// Returns an empty page whose `total_pages` echoes the requested page
    /// number, so tests can tell which page a payload came from. Page 1
    /// resolves slowly.
    struct PageFetch;

    #[async_trait]
    impl Fetch<HistorySubject, TransactionPage> for PageFetch {
        async fn fetch(&self, subject: &HistorySubject) -> Result<TransactionPage, ApiError> {
            if subject.page == 1 {
                sleep(Duration::from_millis(100)).await;
            }
            Ok(TransactionPage {
                transactions: Vec::new(),
                total_pages: subject.page,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_page_result_never_overwrites_current_page() {
        let view = HistoryView::with_fetcher(
            Arc::new(PageFetch),
            PollSchedule::immediate(Duration::from_secs(60)),
        );
        view.activate("0xABC");
        sleep(Duration::from_millis(10)).await; // page-1 fetch is in flight

        view.set_page(2);
        sleep(Duration::from_millis(200)).await; // page-1 fetch has resolved

        assert_eq!(view.page(), Some(2));
        let snap = view.snapshot();
        assert_eq!(snap.result.map(|page| page.total_pages), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn follows_session_account_and_chain() {
        let (provider, events_tx) = MockProvider::new();
        provider.script_accounts(Ok(vec!["0xABC".to_string()]));
        provider.script_chain(Ok("0x1".to_string()));

        let session = WalletSession::spawn(Some(provider));
        let view = HistoryView::with_fetcher(
            Arc::new(PageFetch),
            PollSchedule::immediate(Duration::from_secs(60)),
        );
        let _listener = view.watch_session(&session);
        sleep(Duration::from_millis(10)).await; // let the listener subscribe

        session.connect().await.unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(view.page(), Some(1));
        let armed_generation = view.snapshot().generation;
        assert!(armed_generation > 0);

        // Chain switch: same subject, fresh generation.
        events_tx
            .send(ProviderEvent::ChainChanged("0x89".to_string()))
            .unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(view.page(), Some(1));
        assert!(view.snapshot().generation > armed_generation);

        // Wallet lock: polling stops.
        events_tx
            .send(ProviderEvent::AccountsChanged(Vec::new()))
            .unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(view.page(), None);
    }
}
