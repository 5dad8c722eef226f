use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::api::ApiError;
use crate::sync::schedule::PollSchedule;

/// Fetch operation a poller repeats for its current subject
#[async_trait]
pub trait Fetch<S, T>: Send + Sync {
    async fn fetch(&self, subject: &S) -> Result<T, ApiError>;
}

/// Latest state of a poll subscription, filtered to the current generation
#[derive(Debug, Clone)]
pub struct PollSnapshot<T> {
    pub generation: u64,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

struct Slots<T> {
    result: Option<(u64, T)>,
    error: Option<(u64, ApiError)>,
}

struct Shared<T> {
    generation: AtomicU64,
    slots: Mutex<Slots<T>>,
}

impl<T> Shared<T> {
    fn apply(&self, generation: u64, outcome: Result<T, ApiError>) {
        let mut slots = self.slots.lock().unwrap();
        // Checked under the lock: a fetch that raced a reconfigure either
        // fails this comparison or stores a value the tagged read filters out.
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!("Discarding stale poll outcome (generation {})", generation);
            return;
        }
        match outcome {
            Ok(payload) => slots.result = Some((generation, payload)),
            Err(err) => slots.error = Some((generation, err)),
        }
    }
}

/// Repeatedly fetches a subject on a fixed interval.
///
/// Each activation gets a fresh generation; a fetch result is only applied,
/// and only surfaced, while its generation is still current. Ticks are not
/// serialized against in-flight fetches, so a slow response never delays the
/// next tick. Failures update the error slot and the loop keeps going at the
/// same interval; there is no backoff.
pub struct Poller<S, T> {
    fetcher: Arc<dyn Fetch<S, T>>,
    schedule: PollSchedule,
    shared: Arc<Shared<T>>,
    ticker: Option<JoinHandle<()>>,
}

impl<S, T> Poller<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    pub fn new(fetcher: Arc<dyn Fetch<S, T>>, schedule: PollSchedule) -> Self {
        Self {
            fetcher,
            schedule,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                slots: Mutex::new(Slots {
                    result: None,
                    error: None,
                }),
            }),
            ticker: None,
        }
    }

    /// Begin polling for `subject`. Any previous activation is torn down
    /// first, so this doubles as `reconfigure`.
    pub fn activate(&mut self, subject: S) {
        self.deactivate();

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fetcher = self.fetcher.clone();
        let shared = self.shared.clone();
        let interval = self.schedule.interval;
        let first_tick = if self.schedule.immediate {
            Instant::now()
        } else {
            Instant::now() + interval
        };

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, interval);
            loop {
                ticker.tick().await;
                // Fetches run detached so ticks can overlap a slow response.
                let fetcher = fetcher.clone();
                let shared = shared.clone();
                let subject = subject.clone();
                tokio::spawn(async move {
                    let outcome = fetcher.fetch(&subject).await;
                    shared.apply(generation, outcome);
                });
            }
        });

        self.ticker = Some(handle);
    }

    /// Switch to a new subject: cancels the pending timer, invalidates any
    /// in-flight fetch for the old subject, and starts fresh.
    pub fn reconfigure(&mut self, subject: S) {
        self.activate(subject);
    }

    /// Stop polling. Idempotent; a second call changes nothing. In-flight
    /// fetches are not aborted, but the generation bump makes their eventual
    /// completion a no-op.
    pub fn deactivate(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Current activation generation
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Latest result and error. Entries tagged with a superseded generation
    /// are withheld, never surfaced.
    pub fn snapshot(&self) -> PollSnapshot<T> {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        let slots = self.shared.slots.lock().unwrap();
        let result = match &slots.result {
            Some((tag, payload)) if *tag == generation => Some(payload.clone()),
            _ => None,
        };
        let error = match &slots.error {
            Some((tag, err)) if *tag == generation => Some(err.clone()),
            _ => None,
        };
        PollSnapshot {
            generation,
            result,
            error,
        }
    }
}

impl<S, T> Drop for Poller<S, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}
