// Ingest writer: value lists posted to /api/values are queued on a channel and persisted in batches.
// Flushes on flush_rate buffered lists, every flush_interval_secs, and when all senders are dropped.

use crate::models::ValueList;
use crate::value_repo::ValueRepo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};

/// Channel capacity for the writer (backpressure on POST if the writer falls behind).
pub fn writer_channel_capacity(flush_rate: u64) -> usize {
    usize::try_from(flush_rate)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .max(32)
}

/// Writer config: batching for the value list writer task.
pub struct WriterConfig {
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

/// Spawns the task that receives value lists and flushes them to the DB.
/// When every sender is dropped, it flushes what remains and exits.
pub fn spawn_value_writer(
    mut write_rx: mpsc::Receiver<ValueList>,
    repo: Arc<ValueRepo>,
    config: WriterConfig,
    saved_total: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_secs(config.flush_interval_secs);
    tokio::spawn(async move {
        let mut buffer: Vec<ValueList> = Vec::new();
        let mut flush_tick = interval(flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = write_rx.recv() => {
                    match result {
                        Some(vl) => {
                            buffer.push(vl);
                            if buffer.len() >= config.flush_rate as usize
                                && let Err(e) = flush_buffer(&repo, &mut buffer, &saved_total).await
                            {
                                tracing::warn!(error = %e, "value writer: save_value_lists failed");
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    if let Err(e) = flush_buffer(&repo, &mut buffer, &saved_total).await {
                        tracing::warn!(error = %e, "value writer: save_value_lists failed");
                    }
                }
            }
        }
        if let Err(e) = flush_buffer(&repo, &mut buffer, &saved_total).await {
            tracing::warn!(error = %e, "value writer: final flush failed");
        }
        tracing::debug!("Value writer shutting down");
    })
}

/// A failed batch is dropped, not retried: collectd keeps sending fresh samples.
async fn flush_buffer(
    repo: &ValueRepo,
    buffer: &mut Vec<ValueList>,
    saved_total: &AtomicU64,
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let n = buffer.len();
    let result = repo.save_value_lists(buffer).await;
    buffer.clear();
    result?;
    saved_total.fetch_add(n as u64, Ordering::Relaxed);
    tracing::debug!(
        operation = "save_value_lists",
        lists_count = n,
        "Value lists saved"
    );
    Ok(())
}
