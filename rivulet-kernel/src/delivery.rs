//! Periodic delivery of the browser queue.

use std::sync::Arc;
use std::time::Duration;

use rivulet_api::ForwardMsg;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::MIN_DELIVERY_INTERVAL;
use crate::report::Report;

/// Spawn a task that drains `report`'s browser queue every `period`.
///
/// Each non-empty drain is sent as one batch. Delivery is fire-and-forget:
/// once flushed, messages are gone from the browser queue whether or not the
/// receiver processes them. The task ends when the receiver is dropped.
///
/// A `period` shorter than [`MIN_DELIVERY_INTERVAL`] is raised to it.
pub fn spawn_delivery_loop(
    report: Arc<Report>,
    period: Duration,
    tx: mpsc::Sender<Vec<ForwardMsg>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_DELIVERY_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => {
                    tracing::debug!("delivery receiver dropped, stopping");
                    break;
                }
            }

            let batch = report.flush_browser_queue();
            if batch.is_empty() {
                continue;
            }

            tracing::trace!(count = batch.len(), "delivering batch");
            if tx.send(batch).await.is_err() {
                tracing::debug!("delivery receiver dropped, stopping");
                break;
            }
        }
    })
}
