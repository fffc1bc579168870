// Raw cumulative kernel counters (jiffies, interface bytes)

use serde::{Deserialize, Serialize};

/// One `cpu`/`cpuN` line of the kernel stat file: ticks spent per state since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl RawCpuCounters {
    /// Ticks spent waiting: idle + iowait.
    pub fn idle_ticks(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Ticks spent doing work: user + nice + system + irq + softirq + steal.
    pub fn busy_ticks(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn total_ticks(&self) -> u64 {
        self.idle_ticks().saturating_add(self.busy_ticks())
    }
}

/// A single atomic read of the stat file: the aggregate line plus every per-core line
/// up to the capacity limit. `truncated` is set when the host had more cores than the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuCounterReading {
    pub aggregate: RawCpuCounters,
    pub cores: Vec<RawCpuCounters>,
    pub truncated: bool,
}

/// Received/transmitted bytes summed over every non-loopback interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNetworkCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}
