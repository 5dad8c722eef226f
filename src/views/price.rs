use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::{PricePoint, SpotPrice};
use crate::session::{SessionEvent, WalletSession};
use crate::sync::{Fetch, PollSchedule, PollSnapshot, Poller};

struct SpotPriceFetch {
    api: Arc<ApiClient>,
}

#[async_trait]
impl Fetch<String, SpotPrice> for SpotPriceFetch {
    async fn fetch(&self, token: &String) -> Result<SpotPrice, ApiError> {
        self.api.spot_price(token).await
    }
}

struct PriceHistoryFetch {
    api: Arc<ApiClient>,
    bucket: String,
}

#[async_trait]
impl Fetch<String, Vec<PricePoint>> for PriceHistoryFetch {
    async fn fetch(&self, token: &String) -> Result<Vec<PricePoint>, ApiError> {
        self.api.price_history(token, &self.bucket).await
    }
}

/// Price panel binding: one fast poll for the spot price and one slow poll
/// for the history series, both keyed on the same token. The two are
/// independent subscriptions with their own timers and generations.
pub struct PriceView {
    token: Mutex<Option<String>>,
    spot: Mutex<Poller<String, SpotPrice>>,
    history: Mutex<Poller<String, Vec<PricePoint>>>,
}

impl PriceView {
    pub fn new(api: Arc<ApiClient>, config: &Config) -> Arc<Self> {
        Self::with_fetchers(
            Arc::new(SpotPriceFetch { api: api.clone() }),
            Arc::new(PriceHistoryFetch {
                api,
                bucket: config.price_history_bucket.clone(),
            }),
            PollSchedule::immediate(Duration::from_secs(config.spot_price_interval_secs)),
            PollSchedule::immediate(Duration::from_secs(config.price_history_interval_secs)),
        )
    }

    pub fn with_fetchers(
        spot_fetch: Arc<dyn Fetch<String, SpotPrice>>,
        history_fetch: Arc<dyn Fetch<String, Vec<PricePoint>>>,
        spot_schedule: PollSchedule,
        history_schedule: PollSchedule,
    ) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(None),
            spot: Mutex::new(Poller::new(spot_fetch, spot_schedule)),
            history: Mutex::new(Poller::new(history_fetch, history_schedule)),
        })
    }

    /// Begin polling both panels for `token`
    pub fn activate(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
        self.spot.lock().unwrap().activate(token.to_string());
        self.history.lock().unwrap().activate(token.to_string());
    }

    /// Switch both polls to a new token
    pub fn set_token(&self, token: &str) {
        self.activate(token);
    }

    /// Re-arm both polls for the current token, discarding in-flight work
    pub fn rearm(&self) {
        let token = self.token.lock().unwrap().clone();
        if let Some(token) = token {
            self.spot.lock().unwrap().reconfigure(token.clone());
            self.history.lock().unwrap().reconfigure(token);
        }
    }

    pub fn deactivate(&self) {
        *self.token.lock().unwrap() = None;
        self.spot.lock().unwrap().deactivate();
        self.history.lock().unwrap().deactivate();
    }

    pub fn spot(&self) -> PollSnapshot<SpotPrice> {
        self.spot.lock().unwrap().snapshot()
    }

    pub fn history(&self) -> PollSnapshot<Vec<PricePoint>> {
        self.history.lock().unwrap().snapshot()
    }

    /// React to session events: a chain switch re-arms both polls
    pub fn watch_session(self: &Arc<Self>, session: &WalletSession) -> JoinHandle<()> {
        super::spawn_session_listener(self, session, |view, event| {
            if let SessionEvent::HardReset(_) = event {
                view.rearm();
            }
        })
    }
}
