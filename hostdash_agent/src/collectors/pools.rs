//! Storage pool discovery. Entries of the host mount root are probed with
//! `df`; when that finds nothing the host mount table is used instead.

use crate::error::{MetricError, MetricResult};
use crate::hostfs;
use crate::runner::CommandRunner;
use crate::types::PoolInfo;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Mounts smaller than this are not pools.
pub const MIN_POOL_BYTES: u64 = 1_000_000_000;

const DF_TIMEOUT: Duration = Duration::from_secs(5);

const EXCLUDED_ENTRIES: [&str; 9] = [
    "user0", "disks", "remotes", "addons", "plugins", "appdata", "domains", "system", "libvirt",
];
const EXCLUDED_SUBPATHS: [&str; 3] = ["/mnt/user0", "/mnt/disks", "/mnt/remotes"];
const PSEUDO_FS: [&str; 5] = ["autofs", "tmpfs", "devtmpfs", "sysfs", "proc"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

/// Data row of `df` output as whitespace tokens. Long device names may wrap
/// the row onto two lines, so all lines after the header are joined.
fn df_row(output: &str) -> Vec<&str> {
    output.lines().skip(1).flat_map(str::split_whitespace).collect()
}

/// `df -B1 <path>`
pub fn parse_df_usage(output: &str) -> MetricResult<DiskUsage> {
    let row = df_row(output);
    let num = |i: usize| -> MetricResult<u64> {
        row.get(i)
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| MetricError::ParseFailure(format!("df usage column {i}")))
    };
    let (total, used, available) = (num(1)?, num(2)?, num(3)?);
    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Ok(DiskUsage {
        total,
        used,
        available,
        percent,
    })
}

/// `df -T <path>`
pub fn parse_df_type(output: &str) -> Option<String> {
    df_row(output).get(1).map(|t| t.to_lowercase())
}

pub fn pool_display_name(entry: &str) -> String {
    if entry == "cache" {
        return "Cache Pool".to_string();
    }
    if let Some(n) = entry.strip_prefix("disk") {
        if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
            return format!("Disk {n}");
        }
    }
    let mut chars = entry.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn is_excluded_entry(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_ENTRIES.contains(&name)
}

/// Mount table line -> (mountpoint, fstype) when it looks like a pool.
pub fn pool_mount<'a>(line: &'a str, pool_root: &str) -> Option<(&'a str, &'a str)> {
    let mut parts = line.split_whitespace();
    let (_dev, mountpoint, fstype) = (parts.next()?, parts.next()?, parts.next()?);
    let prefix = format!("{}/", pool_root.trim_end_matches('/'));
    let keep = mountpoint.starts_with(&prefix)
        && !EXCLUDED_SUBPATHS.iter().any(|x| mountpoint.contains(x))
        && !PSEUDO_FS.contains(&fstype);
    keep.then_some((mountpoint, fstype))
}

async fn disk_usage<R: CommandRunner>(runner: &R, path: &str) -> MetricResult<DiskUsage> {
    let out = runner.run("df", &["-B1", path], DF_TIMEOUT).await?;
    parse_df_usage(&out)
}

async fn fs_type<R: CommandRunner>(runner: &R, path: &str) -> String {
    match runner.run("df", &["-T", path], DF_TIMEOUT).await {
        Ok(out) => parse_df_type(&out).unwrap_or_else(|| "unknown".into()),
        Err(_) => "unknown".into(),
    }
}

fn record(name: String, mountpoint: String, fstype: String, u: DiskUsage) -> PoolInfo {
    PoolInfo {
        name,
        mountpoint,
        fstype,
        total: u.total,
        used: u.used,
        free: u.available,
        percent: u.percent,
    }
}

/// Directories of the host mount root that pass the name and size filters.
pub async fn scan_mount_root<R: CommandRunner>(
    runner: &R,
    host_mnt: &Path,
    pool_root: &Path,
) -> Vec<PoolInfo> {
    let mut entries: Vec<String> = match std::fs::read_dir(host_mnt) {
        Ok(rd) => rd
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect(),
        Err(e) => {
            debug!(path = %host_mnt.display(), error = %e, "host mount root unreadable");
            return Vec::new();
        }
    };
    entries.sort();

    let mut pools = Vec::new();
    for entry in entries {
        if is_excluded_entry(&entry) {
            continue;
        }
        let path = host_mnt.join(&entry);
        let path = path.to_string_lossy();
        let usage = match disk_usage(runner, &path).await {
            Ok(u) => u,
            Err(e) => {
                warn!(%path, error = %e, "skipping unreadable mount");
                continue;
            }
        };
        if usage.total < MIN_POOL_BYTES {
            continue;
        }
        let fstype = fs_type(runner, &path).await;
        let mountpoint = pool_root.join(&entry).to_string_lossy().into_owned();
        pools.push(record(pool_display_name(&entry), mountpoint, fstype, usage));
    }
    pools
}

/// Pools from the host mount table, probing each mountpoint by its path.
pub async fn scan_mount_table<R: CommandRunner>(
    runner: &R,
    mounts: &Path,
    pool_root: &Path,
) -> Vec<PoolInfo> {
    let lines = match hostfs::read_lines(mounts) {
        Ok(l) => l,
        Err(e) => {
            debug!(path = %mounts.display(), error = %e, "host mount table unreadable");
            return Vec::new();
        }
    };
    let root = pool_root.to_string_lossy();
    let mut pools = Vec::new();
    for line in &lines {
        let Some((mountpoint, fstype)) = pool_mount(line, &root) else {
            continue;
        };
        let usage = match disk_usage(runner, mountpoint).await {
            Ok(u) if u.total >= MIN_POOL_BYTES => u,
            Ok(_) => continue,
            Err(e) => {
                warn!(%mountpoint, error = %e, "skipping unreadable mount");
                continue;
            }
        };
        let base = mountpoint.rsplit('/').next().unwrap_or(mountpoint);
        pools.push(record(
            pool_display_name(base),
            mountpoint.to_string(),
            fstype.to_string(),
            usage,
        ));
    }
    pools
}

pub async fn collect<R: CommandRunner>(
    runner: &R,
    host_mnt: &Path,
    host_proc_root: &Path,
    pool_root: &Path,
) -> Vec<PoolInfo> {
    let pools = scan_mount_root(runner, host_mnt, pool_root).await;
    if !pools.is_empty() {
        return pools;
    }
    scan_mount_table(runner, &host_proc_root.join("mounts"), pool_root).await
}
