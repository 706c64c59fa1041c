// Background maintenance: prune rows past retention every prune_interval_secs,
// VACUUM on a configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::MaintenanceConfig;
use crate::value_repo::ValueRepo;
use tracing::{info, instrument, warn};

/// Spawns the maintenance worker; it stops when `shutdown_rx` fires.
pub fn spawn(
    repo: Arc<ValueRepo>,
    config: MaintenanceConfig,
    saved_total: Arc<AtomicU64>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config, saved_total, shutdown_rx).await;
    })
}

#[instrument(skip_all, fields(prune_interval_secs = config.prune_interval_secs))]
async fn run(
    repo: Arc<ValueRepo>,
    config: MaintenanceConfig,
    saved_total: Arc<AtomicU64>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut prune_tick = tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    let mut pruned_total: u64 = 0;
    loop {
        tokio::select! {
            _ = prune_tick.tick() => {
                match repo.prune_old_data().await {
                    Ok(n) => {
                        pruned_total += n;
                        info!(
                            pruned = n,
                            pruned_total,
                            saved_total = saved_total.load(Ordering::Relaxed),
                            "retention prune"
                        );
                    }
                    Err(e) => warn!(error = %e, operation = "prune_old_data", "prune failed"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Maintenance worker shutting down");
                break;
            }
        }
    }
    scheduler.abort();
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval). Uses local time for cron.
async fn vacuum_scheduler(config: MaintenanceConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
