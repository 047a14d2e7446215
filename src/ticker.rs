//! Tokio-backed tick source
//!
//! Each hold gets its own interval task that sends its [`TickTag`] down a
//! shared channel. The main loop feeds received tags back to the HUD, which
//! rejects any tag whose timer was cancelled in the meantime.

use keyhud_core::{TickScheduler, TickTag};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

pub struct TokioTicker {
    tx: mpsc::UnboundedSender<TickTag>,
}

impl TokioTicker {
    /// Create a ticker and the receiver its ticks arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TickTag>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TickScheduler for TokioTicker {
    type Handle = JoinHandle<()>;

    fn schedule(&mut self, tag: TickTag, period: Duration) -> JoinHandle<()> {
        let tx = self.tx.clone();
        trace!("Scheduling {} every {:?}", tag.key, period);
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            // A stalled loop catches up instead of stretching the hold
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(tag.clone()).is_err() {
                    break;
                }
            }
        })
    }

    fn cancel(&mut self, handle: JoinHandle<()>) {
        handle.abort();
    }
}
