// Domain models

mod counters;
mod snapshot;

pub use counters::{CpuCounterReading, RawCpuCounters, RawNetworkCounters};
pub use snapshot::{
    CpuStats, DiskStats, GpuStats, MemoryStats, NetworkRates, ProcessStat, SystemIdentity,
    SystemSnapshot, UNKNOWN, UNKNOWN_CPU, UNKNOWN_GPU,
};
