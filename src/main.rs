use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use yams_wui::*;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let repo = Arc::new(
        value_repo::ValueRepo::connect(
            &app_config.database.path,
            app_config.database.retention_days,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    repo.init().await?;

    let saved_total = Arc::new(AtomicU64::new(0));
    let (write_tx, write_rx) =
        mpsc::channel(worker::writer_channel_capacity(app_config.ingest.flush_rate));
    let writer_handle = worker::spawn_value_writer(
        write_rx,
        repo.clone(),
        worker::WriterConfig {
            flush_rate: app_config.ingest.flush_rate,
            flush_interval_secs: app_config.ingest.flush_interval_secs,
        },
        saved_total.clone(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let maintenance_handle = maintenance::spawn(
        repo.clone(),
        app_config.maintenance.clone(),
        saved_total,
        shutdown_rx,
    );

    let app = routes::app(repo, write_tx, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    // The router owns the only ingest sender; once serving stops and it is dropped,
    // the writer flushes its buffer and exits.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = maintenance_handle.await;
    let _ = writer_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
