use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use ringlog_api::Record;

use crate::shared::SharedStore;

/// Commit a `timestamp:` record every `interval` until `token` is cancelled.
///
/// The first record is written one full interval after start.
pub fn spawn_timestamp_task(
    store: SharedStore,
    interval: Duration,
    terminator: u8,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "timestamp task started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let record = Record::timestamp(&chrono::Local::now(), terminator);
                    tracing::debug!(record = ?record, "injecting timestamp");
                    store.commit(record).await;
                }
            }
        }

        tracing::info!("timestamp task stopped");
    })
}
