// Collaborators consumed by the sampler: one trait, one live host implementation.

mod command;
mod host;
mod procfs;

pub use host::HostSource;

use crate::error::SourceResult;
use crate::models::{
    CpuCounterReading, DiskStats, GpuStats, MemoryStats, ProcessStat, RawNetworkCounters,
    SystemIdentity,
};

/// Read-now accessors for every data source a sampling round needs. None of them
/// keep cross-call state; deltas are the sampler's job.
///
/// Methods may block briefly on file or child-process I/O.
pub trait MetricsSource: Send + Sync {
    fn cpu_model(&self) -> SourceResult<String>;

    fn cpu_frequency_mhz(&self) -> SourceResult<f64>;

    /// Logical cores currently online.
    fn core_count(&self) -> SourceResult<usize>;

    /// One atomic read of aggregate and per-core tick counters, keeping at most
    /// `max_cores` per-core entries.
    fn cpu_counters(&self, max_cores: usize) -> SourceResult<CpuCounterReading>;

    fn memory(&self) -> SourceResult<MemoryStats>;

    /// Space on the filesystem that contains `mount`.
    fn disk(&self, mount: &str) -> SourceResult<DiskStats>;

    fn system_identity(&self) -> SourceResult<SystemIdentity>;

    fn gpu(&self) -> SourceResult<GpuStats>;

    /// Up to `limit` processes, highest CPU usage first.
    fn top_processes(&self, limit: usize) -> SourceResult<Vec<ProcessStat>>;

    /// One atomic read of byte counters summed over non-loopback interfaces.
    fn network_counters(&self) -> SourceResult<RawNetworkCounters>;
}
