// Live host source: kernel text files under a configurable proc root, sysinfo for
// identity and disks, external tools for GPU and process listings.

use super::{MetricsSource, command, procfs};
use crate::config::SamplerConfig;
use crate::error::{SourceError, SourceResult};
use crate::models::{
    CpuCounterReading, DiskStats, GpuStats, MemoryStats, ProcessStat, RawNetworkCounters,
    SystemIdentity, UNKNOWN,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Disks, System};
use tracing::instrument;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct HostSource {
    proc_root: PathBuf,
    cpufreq_path: PathBuf,
    gpu_command: String,
    process_command: String,
    sys: Mutex<System>,
    disks: Mutex<Disks>,
}

impl Default for HostSource {
    fn default() -> Self {
        Self::new(&SamplerConfig::default())
    }
}

impl HostSource {
    pub fn new(config: &SamplerConfig) -> Self {
        let sys = System::new_all();
        let disks = Disks::new_with_refreshed_list();
        Self {
            proc_root: PathBuf::from(&config.proc_root),
            cpufreq_path: PathBuf::from(&config.cpufreq_path),
            gpu_command: config.gpu_command.clone(),
            process_command: config.process_command.clone(),
            sys: Mutex::new(sys),
            disks: Mutex::new(disks),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    fn read_proc(&self, origin: &'static str, relative: &str) -> SourceResult<String> {
        read_file(origin, &self.proc_root.join(relative))
    }

    fn sysinfo_cpu<T>(&self, f: impl FnOnce(&System) -> Option<T>) -> SourceResult<Option<T>> {
        let sys = self
            .sys
            .lock()
            .map_err(|e| SourceError::unavailable("sysinfo", format!("lock poisoned: {e}")))?;
        Ok(f(&sys))
    }
}

fn read_file(origin: &'static str, path: &Path) -> SourceResult<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => {
            SourceError::malformed(origin, format!("{}: {e}", path.display()))
        }
        _ => SourceError::unavailable(origin, format!("{}: {e}", path.display())),
    })
}

impl MetricsSource for HostSource {
    #[instrument(skip(self), fields(source = "host", operation = "cpu_model"))]
    fn cpu_model(&self) -> SourceResult<String> {
        let from_cpuinfo = self
            .read_proc("cpu_model", "cpuinfo")
            .ok()
            .and_then(|content| procfs::parse_cpu_model(&content));
        if let Some(model) = from_cpuinfo {
            return Ok(model);
        }
        self.sysinfo_cpu(|sys| {
            sys.cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|s| !s.is_empty())
        })?
        .ok_or_else(|| SourceError::unavailable("cpu_model", "no model name reported"))
    }

    #[instrument(skip(self), fields(source = "host", operation = "cpu_frequency_mhz"))]
    fn cpu_frequency_mhz(&self) -> SourceResult<f64> {
        match read_file("cpu_frequency", &self.cpufreq_path)
            .and_then(|content| procfs::parse_cpufreq_mhz(&content))
        {
            Ok(mhz) => Ok(mhz),
            Err(e) => {
                let mut sys = self.sys.lock().map_err(|le| {
                    SourceError::unavailable("cpu_frequency", format!("lock poisoned: {le}"))
                })?;
                sys.refresh_cpu_frequency();
                sys.cpus()
                    .first()
                    .map(|c| c.frequency())
                    .filter(|f| *f > 0)
                    .map(|f| f as f64)
                    .ok_or(e)
            }
        }
    }

    #[instrument(skip(self), fields(source = "host", operation = "core_count"))]
    fn core_count(&self) -> SourceResult<usize> {
        let count = self.sysinfo_cpu(|sys| Some(sys.cpus().len()))?.unwrap_or(0);
        if count > 0 {
            return Ok(count);
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .map_err(|e| SourceError::unavailable("core_count", e.to_string()))
    }

    #[instrument(skip(self), fields(source = "host", operation = "cpu_counters"))]
    fn cpu_counters(&self, max_cores: usize) -> SourceResult<CpuCounterReading> {
        let content = self.read_proc("cpu_counters", "stat")?;
        procfs::parse_stat(&content, max_cores)
    }

    #[instrument(skip(self), fields(source = "host", operation = "memory"))]
    fn memory(&self) -> SourceResult<MemoryStats> {
        let content = self.read_proc("memory", "meminfo")?;
        procfs::parse_meminfo(&content)
    }

    #[instrument(skip(self), fields(source = "host", operation = "disk"))]
    fn disk(&self, mount: &str) -> SourceResult<DiskStats> {
        let mut disks = self
            .disks
            .lock()
            .map_err(|e| SourceError::unavailable("disk", format!("lock poisoned: {e}")))?;
        disks.refresh(false);
        let path = Path::new(mount);
        // Filesystem containing `mount`: the longest mount point that prefixes it.
        let disk = disks
            .list()
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| {
                SourceError::unavailable("disk", format!("no filesystem mounted at {mount}"))
            })?;

        let total = disk.total_space();
        let free = disk.available_space();
        let used = total.saturating_sub(free);
        let usage_percent = if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Ok(DiskStats {
            mount: mount.to_string(),
            total_gb: total as f64 / BYTES_PER_GIB,
            used_gb: used as f64 / BYTES_PER_GIB,
            free_gb: free as f64 / BYTES_PER_GIB,
            usage_percent,
        })
    }

    #[instrument(skip(self), fields(source = "host", operation = "system_identity"))]
    fn system_identity(&self) -> SourceResult<SystemIdentity> {
        let uptime_secs = System::uptime();
        let os_name = System::name();
        let kernel_version = System::kernel_version();
        if uptime_secs == 0 && os_name.is_none() && kernel_version.is_none() {
            return Err(SourceError::unavailable(
                "system_identity",
                "no uptime, OS name or kernel version reported",
            ));
        }
        Ok(SystemIdentity {
            uptime_secs,
            os_name: os_name.unwrap_or_else(|| UNKNOWN.into()),
            kernel_version: kernel_version.unwrap_or_else(|| UNKNOWN.into()),
        })
    }

    #[instrument(skip(self), fields(source = "host", operation = "gpu"))]
    fn gpu(&self) -> SourceResult<GpuStats> {
        let output = command::run("gpu", &self.gpu_command, command::GPU_QUERY_ARGS)?;
        command::parse_gpu_csv(&output)
    }

    #[instrument(skip(self), fields(source = "host", operation = "top_processes"))]
    fn top_processes(&self, limit: usize) -> SourceResult<Vec<ProcessStat>> {
        let output = command::run("processes", &self.process_command, command::PS_ARGS)?;
        command::parse_ps(&output, limit)
    }

    #[instrument(skip(self), fields(source = "host", operation = "network_counters"))]
    fn network_counters(&self) -> SourceResult<RawNetworkCounters> {
        let content = self.read_proc("network_counters", "net/dev")?;
        procfs::parse_net_dev(&content)
    }
}
