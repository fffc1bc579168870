// Previous raw readings for the delta-tracked metrics (CPU ticks, network bytes).
// Owned by one `Sampler`; starts empty and is overwritten after every round that
// managed to read the corresponding counters.

use crate::delta;
use crate::models::{CpuCounterReading, NetworkRates, RawCpuCounters, RawNetworkCounters};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineState {
    cpu_total: Option<RawCpuCounters>,
    cpu_cores: Vec<Option<RawCpuCounters>>,
    network: Option<RawNetworkCounters>,
}

/// CPU percentages computed against the baseline for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuUsage {
    pub aggregate: f64,
    pub cores: Vec<f64>,
    /// No aggregate baseline existed; every value is zero by definition.
    pub first_sample: bool,
    /// The aggregate counter went backwards; every value is zero and the reading
    /// becomes the fresh baseline.
    pub reset: bool,
}

impl CpuUsage {
    /// All-zero usage for `core_count` cores.
    pub fn zeroed(core_count: usize) -> Self {
        Self {
            aggregate: 0.0,
            cores: vec![0.0; core_count],
            first_sample: false,
            reset: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkDelta {
    pub rates: NetworkRates,
    pub first_sample: bool,
    pub reset: bool,
}

impl BaselineState {
    /// Empty baseline with per-core slots pre-sized for `core_capacity` cores.
    pub fn with_core_capacity(core_capacity: usize) -> Self {
        Self {
            cpu_total: None,
            cpu_cores: vec![None; core_capacity],
            network: None,
        }
    }

    pub fn has_cpu_baseline(&self) -> bool {
        self.cpu_total.is_some()
    }

    pub fn has_network_baseline(&self) -> bool {
        self.network.is_some()
    }

    pub fn cpu_total(&self) -> Option<&RawCpuCounters> {
        self.cpu_total.as_ref()
    }

    pub fn cpu_core(&self, index: usize) -> Option<&RawCpuCounters> {
        self.cpu_cores.get(index).and_then(Option::as_ref)
    }

    pub fn core_slots(&self) -> usize {
        self.cpu_cores.len()
    }

    pub fn network(&self) -> Option<&RawNetworkCounters> {
        self.network.as_ref()
    }

    /// Usage of `reading` relative to the stored baseline, with exactly `core_count`
    /// per-core entries. Cores missing from either side report 0.
    pub fn cpu_usage(&self, reading: &CpuCounterReading, core_count: usize) -> CpuUsage {
        let Some(prev_total) = self.cpu_total.as_ref() else {
            return CpuUsage {
                first_sample: true,
                ..CpuUsage::zeroed(core_count)
            };
        };
        if delta::cpu_counter_reset(prev_total, &reading.aggregate) {
            return CpuUsage {
                reset: true,
                ..CpuUsage::zeroed(core_count)
            };
        }

        let cores = (0..core_count)
            .map(|i| match (self.cpu_core(i), reading.cores.get(i)) {
                (Some(prev), Some(curr)) => delta::cpu_usage_percent(prev, curr),
                _ => 0.0,
            })
            .collect();

        CpuUsage {
            aggregate: delta::cpu_usage_percent(prev_total, &reading.aggregate),
            cores,
            first_sample: false,
            reset: false,
        }
    }

    pub fn network_rates(&self, current: &RawNetworkCounters) -> NetworkDelta {
        match self.network.as_ref() {
            None => NetworkDelta {
                rates: NetworkRates::default(),
                first_sample: true,
                reset: false,
            },
            Some(prev) => NetworkDelta {
                rates: delta::network_rates(prev, current),
                first_sample: false,
                reset: delta::network_counter_reset(prev, current),
            },
        }
    }

    /// Replace the CPU baseline with `reading`. Per-core slots follow the reading's length.
    pub fn commit_cpu(&mut self, reading: &CpuCounterReading) {
        self.cpu_total = Some(reading.aggregate);
        self.cpu_cores.clear();
        self.cpu_cores.extend(reading.cores.iter().copied().map(Some));
    }

    pub fn commit_network(&mut self, current: RawNetworkCounters) {
        self.network = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(busy: u64, idle: u64) -> RawCpuCounters {
        RawCpuCounters {
            user: busy,
            idle,
            ..Default::default()
        }
    }

    fn reading(aggregate: RawCpuCounters, cores: Vec<RawCpuCounters>) -> CpuCounterReading {
        CpuCounterReading {
            aggregate,
            cores,
            truncated: false,
        }
    }

    #[test]
    fn new_baseline_is_empty() {
        let b = BaselineState::with_core_capacity(4);
        assert!(!b.has_cpu_baseline());
        assert!(!b.has_network_baseline());
        assert_eq!(b.core_slots(), 4);
        assert!(b.cpu_core(0).is_none());
    }

    #[test]
    fn first_cpu_usage_is_zero_for_every_core() {
        let b = BaselineState::default();
        let r = reading(cpu(500, 500), vec![cpu(250, 250), cpu(250, 250)]);
        let usage = b.cpu_usage(&r, 2);
        assert!(usage.first_sample);
        assert_eq!(usage.aggregate, 0.0);
        assert_eq!(usage.cores, vec![0.0, 0.0]);
    }

    #[test]
    fn commit_then_delta_per_core() {
        let mut b = BaselineState::default();
        b.commit_cpu(&reading(cpu(0, 0), vec![cpu(0, 0), cpu(0, 0)]));
        let r = reading(cpu(50, 150), vec![cpu(50, 50), cpu(0, 100)]);
        let usage = b.cpu_usage(&r, 2);
        assert!(!usage.first_sample);
        assert!((usage.aggregate - 25.0).abs() < 1e-9);
        assert!((usage.cores[0] - 50.0).abs() < 1e-9);
        assert_eq!(usage.cores[1], 0.0);
    }

    #[test]
    fn cores_without_baseline_or_reading_report_zero() {
        let mut b = BaselineState::default();
        b.commit_cpu(&reading(cpu(0, 0), vec![cpu(0, 0)]));
        let r = reading(cpu(100, 100), vec![cpu(100, 0), cpu(100, 0)]);
        let usage = b.cpu_usage(&r, 3);
        assert_eq!(usage.cores.len(), 3);
        assert_eq!(usage.cores[0], 100.0);
        assert_eq!(usage.cores[1], 0.0);
        assert_eq!(usage.cores[2], 0.0);
    }

    #[test]
    fn aggregate_reset_zeroes_everything() {
        let mut b = BaselineState::default();
        b.commit_cpu(&reading(cpu(9000, 9000), vec![cpu(10, 10)]));
        let r = reading(cpu(10, 10), vec![cpu(20, 20)]);
        let usage = b.cpu_usage(&r, 1);
        assert!(usage.reset);
        assert_eq!(usage.aggregate, 0.0);
        assert_eq!(usage.cores, vec![0.0]);
    }

    #[test]
    fn commit_cpu_replaces_core_slots() {
        let mut b = BaselineState::with_core_capacity(8);
        b.commit_cpu(&reading(cpu(1, 1), vec![cpu(2, 2), cpu(3, 3)]));
        assert_eq!(b.core_slots(), 2);
        assert_eq!(b.cpu_total(), Some(&cpu(1, 1)));
        assert_eq!(b.cpu_core(1), Some(&cpu(3, 3)));
    }

    #[test]
    fn network_first_sample_then_rates() {
        let mut b = BaselineState::default();
        let first = RawNetworkCounters {
            rx_bytes: 2048,
            tx_bytes: 1024,
        };
        let d = b.network_rates(&first);
        assert!(d.first_sample);
        assert_eq!(d.rates, NetworkRates::default());
        b.commit_network(first);

        let second = RawNetworkCounters {
            rx_bytes: 4096,
            tx_bytes: 1024,
        };
        let d = b.network_rates(&second);
        assert!(!d.first_sample);
        assert!(!d.reset);
        assert_eq!(d.rates.rx_kb, 2.0);
        assert_eq!(d.rates.tx_kb, 0.0);
    }
}
