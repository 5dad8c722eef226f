pub mod poller;
pub mod schedule;

pub use poller::Fetch;
pub use poller::PollSnapshot;
pub use poller::Poller;
pub use schedule::PollSchedule;
