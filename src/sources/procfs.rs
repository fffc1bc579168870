// Parsers for kernel-exposed text files. Pure functions over file contents so they
// can be exercised without a live /proc.

use crate::error::{SourceError, SourceResult};
use crate::models::{CpuCounterReading, MemoryStats, RawCpuCounters, RawNetworkCounters};

const KIB_PER_GIB: f64 = 1024.0 * 1024.0;

/// Parse the `stat` file: the `cpu ` aggregate line and up to `max_cores` `cpuN` lines,
/// in file order.
pub(crate) fn parse_stat(content: &str, max_cores: usize) -> SourceResult<CpuCounterReading> {
    let mut aggregate = None;
    let mut cores = Vec::new();
    let mut truncated = false;

    for line in content.lines() {
        let Some(rest) = line.strip_prefix("cpu") else {
            continue;
        };
        if rest.starts_with(' ') {
            aggregate = Some(parse_cpu_fields(rest)?);
        } else if rest.starts_with(|c: char| c.is_ascii_digit()) {
            if cores.len() >= max_cores {
                truncated = true;
                continue;
            }
            let fields = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            cores.push(parse_cpu_fields(fields)?);
        }
    }

    let aggregate = aggregate
        .ok_or_else(|| SourceError::malformed("cpu_counters", "no aggregate `cpu` line"))?;
    if aggregate.total_ticks() == 0 {
        return Err(SourceError::unavailable(
            "cpu_counters",
            "aggregate counters read as zero",
        ));
    }
    Ok(CpuCounterReading {
        aggregate,
        cores,
        truncated,
    })
}

/// user nice system idle [iowait irq softirq steal ...]; fields added by later kernels
/// (guest, guest_nice) are ignored, missing trailing fields read as zero.
fn parse_cpu_fields(fields: &str) -> SourceResult<RawCpuCounters> {
    let values = fields
        .split_whitespace()
        .take(8)
        .map(|v| {
            v.parse::<u64>().map_err(|e| {
                SourceError::malformed("cpu_counters", format!("bad tick value {v:?}: {e}"))
            })
        })
        .collect::<SourceResult<Vec<u64>>>()?;
    if values.len() < 4 {
        return Err(SourceError::malformed(
            "cpu_counters",
            format!("expected at least 4 tick fields, got {}", values.len()),
        ));
    }
    let at = |i: usize| values.get(i).copied().unwrap_or(0);
    Ok(RawCpuCounters {
        user: at(0),
        nice: at(1),
        system: at(2),
        idle: at(3),
        iowait: at(4),
        irq: at(5),
        softirq: at(6),
        steal: at(7),
    })
}

/// Sum receive/transmit bytes of `net/dev` over every interface except `lo`.
pub(crate) fn parse_net_dev(content: &str) -> SourceResult<RawNetworkCounters> {
    let mut totals = RawNetworkCounters::default();
    // Two header lines, then `iface: rx_bytes rx_packets ... tx_bytes ...`
    for line in content.lines().skip(2) {
        let Some((iface, fields)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        let fields: Vec<&str> = fields.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(SourceError::malformed(
                "network_counters",
                format!("interface {iface}: expected at least 9 fields, got {}", fields.len()),
            ));
        }
        if iface == "lo" {
            continue;
        }
        let rx = parse_u64("network_counters", fields[0])?;
        let tx = parse_u64("network_counters", fields[8])?;
        totals.rx_bytes = totals.rx_bytes.saturating_add(rx);
        totals.tx_bytes = totals.tx_bytes.saturating_add(tx);
    }
    Ok(totals)
}

/// First `model name` value of `cpuinfo`.
pub(crate) fn parse_cpu_model(content: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, name)| name.trim())
        .filter(|name| !name.is_empty() && *name != "cpu0")
        .map(str::to_string)
}

/// `MemTotal`/`MemAvailable` (kB) from `meminfo`, reported in GB.
pub(crate) fn parse_meminfo(content: &str) -> SourceResult<MemoryStats> {
    let mut total_kb = None;
    let mut available_kb = None;
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("MemTotal:") {
            total_kb = Some(parse_kb(v)?);
        } else if let Some(v) = line.strip_prefix("MemAvailable:") {
            available_kb = Some(parse_kb(v)?);
        }
        if total_kb.is_some() && available_kb.is_some() {
            break;
        }
    }

    let total_kb = total_kb
        .filter(|t| *t > 0)
        .ok_or_else(|| SourceError::unavailable("memory", "MemTotal missing or zero"))?;
    let used_kb = total_kb.saturating_sub(available_kb.unwrap_or(0));
    Ok(MemoryStats {
        total_gb: total_kb as f64 / KIB_PER_GIB,
        used_gb: used_kb as f64 / KIB_PER_GIB,
        usage_percent: used_kb as f64 / total_kb as f64 * 100.0,
    })
}

fn parse_kb(value: &str) -> SourceResult<u64> {
    let number = value.trim().trim_end_matches("kB").trim();
    parse_u64("memory", number)
}

/// `scaling_cur_freq` holds kHz; returns MHz.
pub(crate) fn parse_cpufreq_mhz(content: &str) -> SourceResult<f64> {
    let khz = parse_u64("cpu_frequency", content.trim())?;
    if khz == 0 {
        return Err(SourceError::unavailable("cpu_frequency", "frequency reads as zero"));
    }
    Ok(khz as f64 / 1000.0)
}

fn parse_u64(origin: &'static str, value: &str) -> SourceResult<u64> {
    value
        .parse::<u64>()
        .map_err(|e| SourceError::malformed(origin, format!("{value:?}: {e}")))
}
