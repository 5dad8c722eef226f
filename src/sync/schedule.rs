use std::time::Duration;

/// Timing for one poll subscription: the tick interval and whether the
/// first fetch fires on activation or only after one interval has elapsed.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub interval: Duration,
    pub immediate: bool,
}

impl PollSchedule {
    pub fn new(interval: Duration, immediate: bool) -> Self {
        Self { interval, immediate }
    }

    /// Schedule whose first fetch fires as soon as the poller is activated
    pub fn immediate(interval: Duration) -> Self {
        Self::new(interval, true)
    }

    /// Schedule whose first fetch waits one full interval
    pub fn deferred(interval: Duration) -> Self {
        Self::new(interval, false)
    }
}
