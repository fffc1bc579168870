// Per-subsystem stats and the unified snapshot handed to callers

use serde::{Deserialize, Serialize};

pub const UNKNOWN_CPU: &str = "Unknown CPU";
pub const UNKNOWN_GPU: &str = "Unknown GPU";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    pub model: String,
    pub core_count: usize,
    pub frequency_mhz: f64,
    pub usage_percent: f64,
    /// One entry per core; always `core_count` long.
    pub core_usage_percent: Vec<f64>,
    /// The host reported more cores than the configured cap.
    #[serde(default)]
    pub cores_truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskStats {
    pub mount: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
}

impl DiskStats {
    /// Zeroed entry for a mount path whose filesystem could not be read.
    pub fn empty(mount: &str) -> Self {
        Self {
            mount: mount.to_string(),
            ..Default::default()
        }
    }
}

/// Kilobytes moved since the previous round (not per second; see `Sampler::sample`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRates {
    pub rx_kb: f64,
    pub tx_kb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuStats {
    pub name: String,
    pub usage_percent: f64,
    pub memory_total_mb: f64,
    pub memory_used_mb: f64,
}

impl Default for GpuStats {
    fn default() -> Self {
        Self {
            name: UNKNOWN_GPU.to_string(),
            usage_percent: 0.0,
            memory_total_mb: 0.0,
            memory_used_mb: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStat {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIdentity {
    pub uptime_secs: u64,
    pub os_name: String,
    pub kernel_version: String,
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self {
            uptime_secs: 0,
            os_name: UNKNOWN.to_string(),
            kernel_version: UNKNOWN.to_string(),
        }
    }
}

/// Everything measured in one sampling round. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    /// Unix epoch millis at the end of the round.
    pub timestamp_ms: u64,
    /// 1-based round number for the sampler that produced this snapshot.
    pub round: u64,
    /// No CPU or network baseline existed yet, so rates were reported as zero.
    pub first_sample: bool,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    /// One entry per configured mount path, in configuration order.
    pub disks: Vec<DiskStats>,
    pub network: NetworkRates,
    pub gpu: GpuStats,
    /// Highest CPU consumers first.
    pub processes: Vec<ProcessStat>,
    pub system: SystemIdentity,
    /// Collaborators that failed this round and were replaced by their fallback.
    #[serde(default)]
    pub degraded: Vec<String>,
}

impl SystemSnapshot {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Disk entry for an exact configured mount path.
    pub fn disk(&self, mount: &str) -> Option<&DiskStats> {
        self.disks.iter().find(|d| d.mount == mount)
    }
}
