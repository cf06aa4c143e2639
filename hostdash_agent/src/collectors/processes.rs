//! Top processes by CPU from the host's process table (a mounted host
//! `/proc`, not the container's own).

use crate::collectors::memory;
use crate::error::MetricResult;
use crate::hostfs;
use crate::types::ProcessInfo;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub const TOP_N: usize = 10;

/// Per-process CPU deltas are taken over this window.
pub const PROC_SAMPLE_WINDOW: Duration = Duration::from_millis(100);

/// Container runtime and self-referential process names (case-insensitive
/// substring match), so the agent does not dominate its own ranking.
pub const EXCLUDED_PROCESS_NAMES: [&str; 7] = [
    "hostdash",
    "docker",
    "containerd",
    "runc",
    "containerd-shim",
    "system-monitor",
    "monitor",
];

pub fn is_excluded_process(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCLUDED_PROCESS_NAMES.iter().any(|x| lower.contains(x))
}

/// `comm` and utime+stime from a `/proc/<pid>/stat` line.
pub fn parse_stat(s: &str) -> Option<(String, u64)> {
    let lpar = s.find('(')?;
    // comm may itself contain ')', so take the last one
    let rpar = s.rfind(')')?;
    let name = s.get(lpar + 1..rpar)?.to_string();
    let after = s.get(rpar + 2..)?; // skip ") "
    let mut it = after.split_whitespace();
    // utime (14th field) is offset 11 from "state", stime (15th) is next
    let utime = it.nth(11)?.parse::<u64>().ok()?;
    let stime = it.next()?.parse::<u64>().ok()?;
    Some((name, utime.saturating_add(stime)))
}

/// Sum of the aggregate `cpu` line of `/proc/stat`.
pub fn parse_total_jiffies(stat: &str) -> Option<u64> {
    let line = stat.lines().next()?;
    let mut it = line.split_whitespace();
    if it.next()? != "cpu" {
        return None;
    }
    Some(
        it.take(8)
            .filter_map(|t| t.parse::<u64>().ok())
            .fold(0u64, u64::saturating_add),
    )
}

/// `VmRSS` from `/proc/<pid>/status`, in bytes. Kernel threads have none.
pub fn parse_rss_bytes(status: &str) -> u64 {
    status
        .lines()
        .find_map(|l| l.strip_prefix("VmRSS:"))
        .and_then(|v| v.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
        .unwrap_or(0)
}

fn read_stat(proc_root: &Path, pid: u32) -> Option<(String, u64)> {
    let s = fs::read_to_string(proc_root.join(pid.to_string()).join("stat")).ok()?;
    parse_stat(&s)
}

fn total_jiffies(proc_root: &Path) -> Option<u64> {
    parse_total_jiffies(&hostfs::read_to_string(&proc_root.join("stat")).ok()?)
}

fn list_pids(proc_root: &Path) -> MetricResult<Vec<u32>> {
    let rd = fs::read_dir(proc_root)
        .map_err(|e| crate::error::MetricError::from_io(&proc_root.display().to_string(), &e))?;
    Ok(rd
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
        .collect())
}

/// One process across both snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcSample {
    pub pid: u32,
    pub name: String,
    pub jiffies_before: u64,
    pub jiffies_after: u64,
    pub rss_bytes: u64,
}

/// CPU share of the whole machine over the window, memory share of
/// `mem_total`; highest CPU first, at most [`TOP_N`]. A zero `total_delta`
/// (machine totals unknown) reports every CPU share as 0.
pub fn rank(samples: Vec<ProcSample>, total_delta: u64, mem_total: u64) -> Vec<ProcessInfo> {
    let mut out: Vec<ProcessInfo> = samples
        .into_iter()
        .filter(|s| !is_excluded_process(&s.name))
        .map(|s| {
            let du = s.jiffies_after.saturating_sub(s.jiffies_before) as f64;
            let cpu_percent = if total_delta == 0 {
                0.0
            } else {
                (du / total_delta as f64 * 100.0).clamp(0.0, 100.0)
            };
            let memory_percent = if mem_total > 0 {
                (s.rss_bytes as f64 / mem_total as f64 * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            };
            ProcessInfo {
                pid: s.pid,
                name: s.name,
                cpu_percent,
                memory_percent,
                memory_mb: s.rss_bytes as f64 / 1024.0 / 1024.0,
            }
        })
        .collect();
    out.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    out.truncate(TOP_N);
    out
}

pub async fn collect(proc_root: &Path) -> Vec<ProcessInfo> {
    let pids = match list_pids(proc_root) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "host process table unreadable");
            return Vec::new();
        }
    };

    let before: Vec<(u32, String, u64)> = pids
        .into_iter()
        .filter_map(|pid| read_stat(proc_root, pid).map(|(name, j)| (pid, name, j)))
        .filter(|(_, name, _)| !is_excluded_process(name))
        .collect();
    let total_before = total_jiffies(proc_root);

    sleep(PROC_SAMPLE_WINDOW).await;

    let total_after = total_jiffies(proc_root);
    // processes that exited or became unreadable in between are dropped
    let samples: Vec<ProcSample> = before
        .into_iter()
        .filter_map(|(pid, name, jiffies_before)| {
            let (_, jiffies_after) = read_stat(proc_root, pid)?;
            let status = fs::read_to_string(proc_root.join(pid.to_string()).join("status")).ok()?;
            Some(ProcSample {
                pid,
                name,
                jiffies_before,
                jiffies_after,
                rss_bytes: parse_rss_bytes(&status),
            })
        })
        .collect();

    let total_delta = match (total_before, total_after) {
        (Some(b), Some(a)) => a.saturating_sub(b),
        _ => {
            warn!("host cpu totals unreadable, reporting processes without cpu share");
            0
        }
    };
    let mem_total = memory::total_bytes(proc_root).unwrap_or(0);
    rank(samples, total_delta, mem_total)
}
