// One sampling round: query every collaborator, turn cumulative counters into rates
// against the stored baseline, fall back per field on failure, build the snapshot.

use crate::baseline::{BaselineState, CpuUsage};
use crate::config::SamplerConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::{CpuStats, DiskStats, SystemSnapshot, UNKNOWN_CPU};
use crate::sources::MetricsSource;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Limits and targets for a sampler, derived from `[sampler]` config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSettings {
    pub max_cores: usize,
    pub max_processes: usize,
    pub disk_paths: Vec<String>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        (&SamplerConfig::default()).into()
    }
}

impl From<&SamplerConfig> for SamplerSettings {
    fn from(config: &SamplerConfig) -> Self {
        Self {
            max_cores: config.max_cores.max(1),
            max_processes: config.max_processes,
            disk_paths: config.disk_paths.clone(),
        }
    }
}

struct RoundState {
    baseline: BaselineState,
    rounds: u64,
}

/// Produces `SystemSnapshot`s from a `MetricsSource`, keeping the previous raw CPU and
/// network readings between calls.
///
/// `sample` never fails: a collaborator error is logged and replaced by that field's
/// fallback. Concurrent callers are serialized so each round reads and replaces the
/// baseline as a unit.
pub struct Sampler<S> {
    source: S,
    settings: SamplerSettings,
    state: Mutex<RoundState>,
}

impl<S: MetricsSource> Sampler<S> {
    pub fn new(source: S, settings: SamplerSettings) -> Self {
        let baseline = BaselineState::with_core_capacity(settings.max_cores);
        Self::with_baseline(source, settings, baseline)
    }

    /// Start from a known baseline instead of an empty one.
    pub fn with_baseline(source: S, settings: SamplerSettings, baseline: BaselineState) -> Self {
        Self {
            source,
            settings,
            state: Mutex::new(RoundState {
                baseline,
                rounds: 0,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Copy of the current baseline.
    pub fn baseline(&self) -> BaselineState {
        self.lock_state().baseline.clone()
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.lock_state().rounds
    }

    // Baseline is plain data; a panic elsewhere cannot leave it half-written.
    fn lock_state(&self) -> std::sync::MutexGuard<'_, RoundState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one sampling round.
    ///
    /// The first round (no baseline yet) reports 0% CPU and zero network rates. Network
    /// rates are kilobytes since the previous round, so they equal KB/s only when the
    /// caller samples once per second.
    pub fn sample(&self) -> SystemSnapshot {
        let mut state = self.lock_state();
        let mut round = Round::default();

        let model = round
            .take(self.source.cpu_model().and_then(non_empty_model))
            .unwrap_or_else(|| UNKNOWN_CPU.to_string());
        let frequency_mhz = round.take(self.source.cpu_frequency_mhz()).unwrap_or(0.0);
        let core_count = round
            .take(self.source.core_count().and_then(non_zero_cores))
            .unwrap_or(1)
            .clamp(1, self.settings.max_cores);

        let cpu_reading = round.take(self.source.cpu_counters(self.settings.max_cores));
        let (usage, cores_truncated) = match &cpu_reading {
            Some(reading) => {
                let usage = state.baseline.cpu_usage(reading, core_count);
                if usage.first_sample {
                    debug!("first CPU sample, establishing baseline");
                } else if usage.reset {
                    debug!("CPU counters went backwards, re-establishing baseline");
                }
                (usage, reading.truncated)
            }
            None => (CpuUsage::zeroed(core_count), false),
        };

        let memory = round.take(self.source.memory()).unwrap_or_default();
        let disks: Vec<DiskStats> = self
            .settings
            .disk_paths
            .iter()
            .map(|mount| {
                round
                    .take(self.source.disk(mount))
                    .unwrap_or_else(|| DiskStats::empty(mount))
            })
            .collect();
        let system = round.take(self.source.system_identity()).unwrap_or_default();
        let gpu = round.take(self.source.gpu()).unwrap_or_default();
        let mut processes = round
            .take(self.source.top_processes(self.settings.max_processes))
            .unwrap_or_default();
        processes.truncate(self.settings.max_processes);

        let net_reading = round.take(self.source.network_counters());
        let net = net_reading.map(|current| state.baseline.network_rates(&current));
        if let Some(delta) = &net {
            if delta.first_sample {
                debug!("first network sample, establishing baseline");
            } else if delta.reset {
                debug!("network counters went backwards, re-establishing baseline");
            }
        }

        // Every read for the round is done; only now replace the baselines.
        if let Some(reading) = &cpu_reading {
            state.baseline.commit_cpu(reading);
        }
        if let Some(current) = net_reading {
            state.baseline.commit_network(current);
        }
        state.rounds += 1;

        SystemSnapshot {
            timestamp_ms: now_ms(),
            round: state.rounds,
            first_sample: usage.first_sample || net.is_some_and(|d| d.first_sample),
            cpu: CpuStats {
                model,
                core_count,
                frequency_mhz,
                usage_percent: usage.aggregate,
                core_usage_percent: usage.cores,
                cores_truncated,
            },
            memory,
            disks,
            network: net.map(|d| d.rates).unwrap_or_default(),
            gpu,
            processes,
            system,
            degraded: round.degraded,
        }
    }
}

/// Collects the names of collaborators that fell back during one round.
#[derive(Default)]
struct Round {
    degraded: Vec<String>,
}

impl Round {
    fn take<T>(&mut self, result: SourceResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    source = e.origin(),
                    kind = ?e.kind(),
                    error = %e,
                    "metrics source failed, using fallback"
                );
                if !self.degraded.iter().any(|d| d == e.origin()) {
                    self.degraded.push(e.origin().to_string());
                }
                None
            }
        }
    }
}

fn non_empty_model(model: String) -> SourceResult<String> {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        return Err(SourceError::unavailable("cpu_model", "empty model name"));
    }
    Ok(trimmed.to_string())
}

fn non_zero_cores(count: usize) -> SourceResult<usize> {
    if count == 0 {
        return Err(SourceError::unavailable("core_count", "zero cores reported"));
    }
    Ok(count)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
