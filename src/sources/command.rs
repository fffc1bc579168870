// External tools: GPU via the vendor diagnostic CLI, top processes via `ps`.

use crate::error::{SourceError, SourceResult};
use crate::models::{GpuStats, ProcessStat};
use std::io::ErrorKind;
use std::process::Command;

pub(crate) const GPU_QUERY_ARGS: &[&str] = &[
    "--query-gpu=name,utilization.gpu,memory.total,memory.used",
    "--format=csv,noheader,nounits",
];

pub(crate) const PS_ARGS: &[&str] = &["-eo", "pid,comm,%cpu,%mem,user", "--sort=-%cpu"];

/// Run `program` to completion and return its stdout. A missing binary or a non-zero
/// exit is reported as unavailable.
pub(crate) fn run(origin: &'static str, program: &str, args: &[&str]) -> SourceResult<String> {
    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SourceError::unavailable(origin, format!("`{program}` not found"))
        } else {
            SourceError::unavailable(origin, format!("failed to run `{program}`: {e}"))
        }
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::unavailable(
            origin,
            format!("`{program}` exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// First line of `name, utilization, memory.total, memory.used` CSV output.
pub(crate) fn parse_gpu_csv(output: &str) -> SourceResult<GpuStats> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| SourceError::unavailable("gpu", "no GPU reported"))?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, usage, total, used] = fields[..] else {
        return Err(SourceError::malformed(
            "gpu",
            format!("expected 4 comma-separated fields, got {}", fields.len()),
        ));
    };
    if name.is_empty() {
        return Err(SourceError::malformed("gpu", "empty device name"));
    }
    Ok(GpuStats {
        name: name.to_string(),
        usage_percent: parse_gpu_number(usage)?,
        memory_total_mb: parse_gpu_number(total)?,
        memory_used_mb: parse_gpu_number(used)?,
    })
}

// Some boards report `[N/A]` for fields they do not support.
fn parse_gpu_number(value: &str) -> SourceResult<f64> {
    if value.trim_matches(|c| c == '[' || c == ']') == "N/A" {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .map_err(|e| SourceError::malformed("gpu", format!("{value:?}: {e}")))
}

/// `ps -eo pid,comm,%cpu,%mem,user` output, header first, already sorted by CPU.
/// Rows that do not parse are skipped; at most `limit` rows are returned.
pub(crate) fn parse_ps(output: &str, limit: usize) -> SourceResult<Vec<ProcessStat>> {
    let mut lines = output.lines();
    let header = lines
        .next()
        .ok_or_else(|| SourceError::malformed("processes", "empty output"))?;
    if !header.trim_start().starts_with("PID") {
        return Err(SourceError::malformed(
            "processes",
            format!("unexpected header {:?}", header.trim()),
        ));
    }
    Ok(lines.filter_map(parse_ps_row).take(limit).collect())
}

fn parse_ps_row(line: &str) -> Option<ProcessStat> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    // pid <comm, possibly with spaces> %cpu %mem user
    if fields.len() < 5 {
        return None;
    }
    let n = fields.len();
    Some(ProcessStat {
        pid: fields[0].parse().ok()?,
        name: fields[1..n - 3].join(" "),
        cpu_percent: fields[n - 3].parse().ok()?,
        mem_percent: fields[n - 2].parse().ok()?,
        user: fields[n - 1].to_string(),
    })
}
