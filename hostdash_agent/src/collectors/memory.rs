//! Memory accounting from `meminfo`, presented the way storage appliance UIs
//! do: page cache and reclaimable slab count as free.

use crate::error::{MetricError, MetricResult};
use crate::hostfs;
use crate::types::MemoryInfo;
use std::collections::HashMap;
use std::path::Path;

/// Value of a `meminfo` field in bytes (the file reports kB). Missing or
/// malformed fields read as 0.
fn kb_field(fields: &HashMap<String, String>, key: &str) -> u64 {
    fields
        .get(key)
        .and_then(|v| v.split_whitespace().next())
        .and_then(|n| n.parse::<u64>().ok())
        .map(|kb| kb.saturating_mul(1024))
        .unwrap_or(0)
}

pub fn from_meminfo(fields: &HashMap<String, String>) -> MetricResult<MemoryInfo> {
    let total = kb_field(fields, "MemTotal");
    if total == 0 {
        return Err(MetricError::ParseFailure("meminfo: MemTotal missing".into()));
    }
    let mem_free = kb_field(fields, "MemFree");
    let buffers = kb_field(fields, "Buffers");
    let cached = kb_field(fields, "Cached");
    let sreclaimable = kb_field(fields, "SReclaimable");
    let shmem = kb_field(fields, "Shmem");
    let slab = kb_field(fields, "Slab");

    let system = buffers + cached + sreclaimable;
    let free = mem_free + system;
    let used = total.saturating_sub(free);

    // Fixed-ratio estimates, not exact accounting; values above the
    // physical total are possible and left as is.
    let docker = slab / 2;
    let vm = shmem.saturating_mul(3) / 2;

    let swap_total = kb_field(fields, "SwapTotal");
    let swap_free = kb_field(fields, "SwapFree");
    let swap_used = swap_total.saturating_sub(swap_free);
    let swap_percent = if swap_total > 0 {
        swap_used as f64 / swap_total as f64 * 100.0
    } else {
        0.0
    };

    Ok(MemoryInfo {
        total,
        free,
        used,
        percent: used as f64 / total as f64 * 100.0,
        system,
        vm,
        docker,
        swap_total,
        swap_used,
        swap_free,
        swap_percent,
    })
}

pub fn collect(proc_root: &Path) -> MetricResult<MemoryInfo> {
    let lines = hostfs::read_lines(&proc_root.join("meminfo"))
        .map_err(|e| MetricError::Unavailable(format!("Cannot read memory info: {e}")))?;
    from_meminfo(&hostfs::parse_colon_pairs(lines.iter().map(String::as_str)))
}

/// `MemTotal` in bytes, for per-process memory percentages.
pub fn total_bytes(proc_root: &Path) -> Option<u64> {
    let lines = hostfs::read_lines(&proc_root.join("meminfo")).ok()?;
    let fields = hostfs::parse_colon_pairs(lines.iter().map(String::as_str));
    Some(kb_field(&fields, "MemTotal")).filter(|&t| t > 0)
}
