// Pure conversions from a (previous, current) pair of cumulative counters to rates.

use crate::models::{NetworkRates, RawCpuCounters, RawNetworkCounters};

pub const BYTES_PER_KB: f64 = 1024.0;

/// Busy share of the ticks elapsed between `prev` and `curr`, in percent.
///
/// Returns 0 when no ticks elapsed (sampled too fast or frozen counters) and when the
/// total went backwards (counter reset); the caller stores `curr` as the new baseline
/// either way, so the next round measures from the fresh reading.
pub fn cpu_usage_percent(prev: &RawCpuCounters, curr: &RawCpuCounters) -> f64 {
    let Some(total_diff) = curr.total_ticks().checked_sub(prev.total_ticks()) else {
        return 0.0;
    };
    if total_diff == 0 {
        return 0.0;
    }
    let idle_diff = curr.idle_ticks().saturating_sub(prev.idle_ticks());
    let busy_diff = total_diff.saturating_sub(idle_diff);
    (busy_diff as f64 * 100.0 / total_diff as f64).clamp(0.0, 100.0)
}

/// True when the total tick count decreased, e.g. after a reboot.
pub fn cpu_counter_reset(prev: &RawCpuCounters, curr: &RawCpuCounters) -> bool {
    curr.total_ticks() < prev.total_ticks()
}

/// Kilobytes received/transmitted since `prev`. A direction whose counter went
/// backwards reports 0 for this round.
pub fn network_rates(prev: &RawNetworkCounters, curr: &RawNetworkCounters) -> NetworkRates {
    NetworkRates {
        rx_kb: kb_since(prev.rx_bytes, curr.rx_bytes),
        tx_kb: kb_since(prev.tx_bytes, curr.tx_bytes),
    }
}

pub fn network_counter_reset(prev: &RawNetworkCounters, curr: &RawNetworkCounters) -> bool {
    curr.rx_bytes < prev.rx_bytes || curr.tx_bytes < prev.tx_bytes
}

fn kb_since(prev: u64, curr: u64) -> f64 {
    curr.checked_sub(prev)
        .map_or(0.0, |diff| diff as f64 / BYTES_PER_KB)
}
