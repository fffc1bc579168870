// Shared test helpers: a scriptable in-memory metrics source.

#![allow(dead_code)]

use hostsampler::error::{SourceError, SourceResult};
use hostsampler::models::*;
use hostsampler::sources::MetricsSource;
use std::collections::HashSet;
use std::sync::Mutex;

/// Fake source whose counters and failures tests can change between rounds.
pub struct FakeSource {
    pub cores: Mutex<usize>,
    pub cpu: Mutex<CpuCounterReading>,
    pub net: Mutex<RawNetworkCounters>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeSource {
    pub fn new(cores: usize) -> Self {
        Self {
            cores: Mutex::new(cores),
            cpu: Mutex::new(cpu_reading(0, 1000, cores)),
            net: Mutex::new(RawNetworkCounters::default()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_cpu(&self, reading: CpuCounterReading) {
        *self.cpu.lock().unwrap() = reading;
    }

    pub fn set_net(&self, rx_bytes: u64, tx_bytes: u64) {
        *self.net.lock().unwrap() = RawNetworkCounters { rx_bytes, tx_bytes };
    }

    pub fn set_core_count(&self, cores: usize) {
        *self.cores.lock().unwrap() = cores;
    }

    /// Make the named collaborator fail until `recover` is called.
    pub fn fail(&self, origin: &'static str) {
        self.failing.lock().unwrap().insert(origin);
    }

    pub fn recover(&self, origin: &'static str) {
        self.failing.lock().unwrap().remove(origin);
    }

    fn check(&self, origin: &'static str) -> SourceResult<()> {
        if self.failing.lock().unwrap().contains(origin) {
            return Err(SourceError::unavailable(origin, "scripted failure"));
        }
        Ok(())
    }
}

/// Aggregate = sum of `cores` identical per-core counters with the given busy/idle ticks.
pub fn cpu_reading(busy_per_core: u64, idle_per_core: u64, cores: usize) -> CpuCounterReading {
    let core = RawCpuCounters {
        user: busy_per_core,
        idle: idle_per_core,
        ..Default::default()
    };
    CpuCounterReading {
        aggregate: RawCpuCounters {
            user: busy_per_core * cores as u64,
            idle: idle_per_core * cores as u64,
            ..Default::default()
        },
        cores: vec![core; cores],
        truncated: false,
    }
}

impl MetricsSource for FakeSource {
    fn cpu_model(&self) -> SourceResult<String> {
        self.check("cpu_model")?;
        Ok("Fake CPU @ 3.00GHz".into())
    }

    fn cpu_frequency_mhz(&self) -> SourceResult<f64> {
        self.check("cpu_frequency")?;
        Ok(3000.0)
    }

    fn core_count(&self) -> SourceResult<usize> {
        self.check("core_count")?;
        Ok(*self.cores.lock().unwrap())
    }

    fn cpu_counters(&self, max_cores: usize) -> SourceResult<CpuCounterReading> {
        self.check("cpu_counters")?;
        let mut reading = self.cpu.lock().unwrap().clone();
        if reading.cores.len() > max_cores {
            reading.cores.truncate(max_cores);
            reading.truncated = true;
        }
        Ok(reading)
    }

    fn memory(&self) -> SourceResult<MemoryStats> {
        self.check("memory")?;
        Ok(MemoryStats {
            total_gb: 16.0,
            used_gb: 4.0,
            usage_percent: 25.0,
        })
    }

    fn disk(&self, mount: &str) -> SourceResult<DiskStats> {
        self.check("disk")?;
        Ok(DiskStats {
            mount: mount.to_string(),
            total_gb: 100.0,
            used_gb: 40.0,
            free_gb: 60.0,
            usage_percent: 40.0,
        })
    }

    fn system_identity(&self) -> SourceResult<SystemIdentity> {
        self.check("system_identity")?;
        Ok(SystemIdentity {
            uptime_secs: 3600,
            os_name: "Linux".into(),
            kernel_version: "6.1.0-test".into(),
        })
    }

    fn gpu(&self) -> SourceResult<GpuStats> {
        self.check("gpu")?;
        Ok(GpuStats {
            name: "Fake GPU".into(),
            usage_percent: 12.0,
            memory_total_mb: 8192.0,
            memory_used_mb: 1024.0,
        })
    }

    fn top_processes(&self, limit: usize) -> SourceResult<Vec<ProcessStat>> {
        self.check("processes")?;
        Ok((0..50u32)
            .map(|i| ProcessStat {
                pid: 1000 + i,
                name: format!("proc{i}"),
                cpu_percent: 50.0 - i as f64,
                mem_percent: 1.0,
                user: "tester".into(),
            })
            .take(limit)
            .collect())
    }

    fn network_counters(&self) -> SourceResult<RawNetworkCounters> {
        self.check("network_counters")?;
        Ok(*self.net.lock().unwrap())
    }
}
