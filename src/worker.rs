// Background sampling task: one `Sampler::sample` per tick, snapshots published on a
// broadcast channel. Rounds run on the blocking pool since sources read files and
// spawn child processes.

use crate::models::SystemSnapshot;
use crate::sampler::Sampler;
use crate::sources::MetricsSource;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for the "no subscribers" message.
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

pub struct WorkerDeps<S> {
    pub sampler: Arc<Sampler<S>>,
    pub tx: broadcast::Sender<Arc<SystemSnapshot>>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    /// How often to log sampler stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn<S>(deps: WorkerDeps<S>, config: WorkerConfig) -> tokio::task::JoinHandle<()>
where
    S: MetricsSource + 'static,
{
    let WorkerDeps {
        sampler,
        tx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval_ms,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", sample_interval_ms);

    let task = async move {
        let mut tick = interval(Duration::from_millis(sample_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // interval fires immediately; skip the empty stats line at startup.
        stats_log_tick.tick().await;

        let mut rounds_total: u64 = 0;
        let mut degraded_rounds_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let round_sampler = sampler.clone();
                    let snapshot = match tokio::task::spawn_blocking(move || round_sampler.sample()).await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "sample",
                                "sampling round panicked"
                            );
                            continue;
                        }
                    };

                    rounds_total += 1;
                    if snapshot.is_degraded() {
                        degraded_rounds_total += 1;
                    }
                    match serde_json::to_string(&snapshot) {
                        Ok(json) => tracing::debug!(round = snapshot.round, snapshot = %json, "round complete"),
                        Err(e) => tracing::debug!(round = snapshot.round, error = %e, "round complete (unserializable)"),
                    }

                    if tx.send(Arc::new(snapshot)).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active subscribers; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        rounds_total,
                        degraded_rounds_total,
                        subscribers = tx.receiver_count(),
                        "sampler stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(worker_span))
}
