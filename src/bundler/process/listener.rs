//! Listener seam and the blocking dispatcher that feeds it.

use super::events::WatchEvent;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receives watch-mode events, one at a time and in emission order.
///
/// Runs on a dedicated blocking thread: a slow listener delays delivery but
/// never the reading of esbuild's output. Errors and panics are logged and
/// the next event is still delivered.
///
/// Any `FnMut(WatchEvent) -> anyhow::Result<()>` closure is a listener.
pub trait BuildEventListener: Send + 'static {
    /// Handles one event.
    fn on_event(&mut self, event: WatchEvent) -> anyhow::Result<()>;
}

impl<F> BuildEventListener for F
where
    F: FnMut(WatchEvent) -> anyhow::Result<()> + Send + 'static,
{
    fn on_event(&mut self, event: WatchEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Delivers events from `events` to `listener` until the channel closes or
/// `cancel` fires.
pub(super) fn spawn_dispatcher<L: BuildEventListener>(
    mut events: UnboundedReceiver<WatchEvent>,
    mut listener: L,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut delivered = 0usize;
        while let Some(event) = events.blocking_recv() {
            if cancel.is_cancelled() {
                break;
            }
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Build event listener failed: {e:#}"),
                Err(panic) => log::warn!("Build event listener panicked: {}", panic_message(&*panic)),
            }
            delivered += 1;
        }
        log::debug!("Event dispatcher stopped after {delivered} events");
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
