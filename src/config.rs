use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Directory holding `stat`, `net/dev`, `meminfo` and `cpuinfo`.
    pub proc_root: String,
    /// File holding the current frequency of the first core, in kHz.
    pub cpufreq_path: String,
    /// Per-core capacity; cores beyond it are dropped and flagged as truncated.
    pub max_cores: usize,
    /// Maximum number of rows in the top-process listing.
    pub max_processes: usize,
    /// Mount paths reported in each snapshot, in order.
    pub disk_paths: Vec<String>,
    pub gpu_command: String,
    pub process_command: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            proc_root: "/proc".into(),
            cpufreq_path: "/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq".into(),
            max_cores: 64,
            max_processes: 30,
            disk_paths: vec!["/".into()],
            gpu_command: "nvidia-smi".into(),
            process_command: "ps".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub sample_interval_ms: u64,
    /// How often to log sampler stats (rounds, degraded rounds) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            stats_log_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Max number of snapshots buffered per subscriber (slow subscribers may lag).
    pub broadcast_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (must exist when set) or `config.toml` in the working
    /// directory; without either, built-in defaults apply.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?;
                Self::load_from_str(&s)
            }
            Err(_) => match std::fs::read_to_string("config.toml") {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("config.toml not found, using defaults");
                    Ok(Self::default())
                }
                Err(e) => Err(anyhow::anyhow!("config config.toml: {}", e)),
            },
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.sampler.proc_root.is_empty(),
            "sampler.proc_root must be non-empty"
        );
        anyhow::ensure!(
            self.sampler.max_cores > 0,
            "sampler.max_cores must be > 0, got {}",
            self.sampler.max_cores
        );
        anyhow::ensure!(
            self.sampler.max_processes > 0,
            "sampler.max_processes must be > 0, got {}",
            self.sampler.max_processes
        );
        anyhow::ensure!(
            !self.sampler.disk_paths.is_empty(),
            "sampler.disk_paths must list at least one mount path"
        );
        anyhow::ensure!(
            self.sampler.disk_paths.iter().all(|p| !p.is_empty()),
            "sampler.disk_paths entries must be non-empty"
        );
        anyhow::ensure!(
            !self.sampler.gpu_command.is_empty(),
            "sampler.gpu_command must be non-empty"
        );
        anyhow::ensure!(
            !self.sampler.process_command.is_empty(),
            "sampler.process_command must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
