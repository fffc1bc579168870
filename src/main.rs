use anyhow::Result;
use hostsampler::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

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
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        proc_root = %app_config.sampler.proc_root,
        sample_interval_ms = app_config.monitoring.sample_interval_ms,
        "starting {}",
        env!("CARGO_PKG_NAME")
    );

    let source = sources::HostSource::new(&app_config.sampler);
    let sampler = Arc::new(sampler::Sampler::new(
        source,
        sampler::SamplerSettings::from(&app_config.sampler),
    ));

    let (tx, rx) = broadcast::channel::<Arc<models::SystemSnapshot>>(
        app_config.publishing.broadcast_capacity,
    );
    let reporter_handle = tokio::spawn(report(rx));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            sampler,
            tx,
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: app_config.monitoring.sample_interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    worker_handle
        .await
        .map_err(|e| anyhow::anyhow!("worker task join: {}", e))?;
    // The worker owned the only sender; the reporter drains and exits.
    reporter_handle
        .await
        .map_err(|e| anyhow::anyhow!("reporter task join: {}", e))?;
    Ok(())
}

/// One summary line per snapshot.
async fn report(mut rx: broadcast::Receiver<Arc<models::SystemSnapshot>>) {
    loop {
        match rx.recv().await {
            Ok(s) => tracing::info!(
                round = s.round,
                cpu_percent = format_args!("{:.1}", s.cpu.usage_percent),
                mem_percent = format_args!("{:.1}", s.memory.usage_percent),
                rx_kb = format_args!("{:.1}", s.network.rx_kb),
                tx_kb = format_args!("{:.1}", s.network.tx_kb),
                gpu = %s.gpu.name,
                degraded = ?s.degraded,
                "snapshot"
            ),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "reporter lagged behind sampler");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
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
