use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::session::{SessionEvent, WalletSession};

pub mod history;
pub mod pools;
pub mod price;

pub use history::HistorySubject;
pub use history::HistoryView;
pub use pools::PoolsView;
pub use price::PriceView;

/// Spawn a task that forwards session events to a view. The task holds the
/// view weakly and exits when the view is dropped or the session closes.
pub(crate) fn spawn_session_listener<V>(
    view: &Arc<V>,
    session: &WalletSession,
    apply: impl Fn(&V, SessionEvent) + Send + Sync + 'static,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let weak = Arc::downgrade(view);
    let session = session.clone();
    tokio::spawn(async move {
        let Ok(mut events) = session.subscribe().await else {
            return;
        };
        while let Some(event) = events.recv().await {
            let Some(view) = weak.upgrade() else { break };
            apply(&view, event);
        }
    })
}
