//! Disk I/O counters from `diskstats`, with read/write throughput derived
//! against the previous sample.

use crate::error::{MetricError, MetricResult};
use crate::hostfs;
use crate::rate::{format_speed, CounterPair, RatePair, RateTracker};
use crate::types::DiskIoInfo;
use std::path::Path;
use tracing::warn;

const SECTOR_SIZE: u64 = 512;

/// Cumulative counters summed over whole disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
    pub read_time: u64,
    pub write_time: u64,
}

impl DiskCounters {
    /// (read, written) bytes, the pair rates are derived from.
    pub fn bytes(&self) -> CounterPair {
        CounterPair::new(self.read_bytes, self.write_bytes)
    }
}

// Partitions would double count their parent disk.
fn is_partition(dev: &str) -> bool {
    if dev.starts_with("nvme") || dev.starts_with("mmcblk") {
        return dev.rsplit_once('p').is_some_and(|(head, tail)| {
            !tail.is_empty()
                && tail.bytes().all(|b| b.is_ascii_digit())
                && head.bytes().last().is_some_and(|b| b.is_ascii_digit())
        });
    }
    ["sd", "hd", "vd", "xvd"].iter().any(|p| dev.starts_with(p))
        && dev.bytes().last().is_some_and(|b| b.is_ascii_digit())
}

fn is_counted_device(dev: &str) -> bool {
    const VIRTUAL: [&str; 4] = ["loop", "ram", "dm-", "zram"];
    !VIRTUAL.iter().any(|p| dev.starts_with(p)) && !is_partition(dev)
}

/// Sum `diskstats` lines; `None` when no whole-disk device is listed.
pub fn parse_diskstats<'a, I>(lines: I) -> Option<DiskCounters>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = DiskCounters::default();
    let mut seen = false;
    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 || !is_counted_device(parts[2]) {
            continue;
        }
        let field = |i: usize| parts[i].parse::<u64>().unwrap_or(0);
        total.read_count += field(3);
        total.read_bytes += field(5) * SECTOR_SIZE;
        total.read_time += field(6);
        total.write_count += field(7);
        total.write_bytes += field(9) * SECTOR_SIZE;
        total.write_time += field(10);
        seen = true;
    }
    seen.then_some(total)
}

pub fn to_record(counters: DiskCounters, r: RatePair) -> DiskIoInfo {
    DiskIoInfo {
        read_bytes: counters.read_bytes,
        write_bytes: counters.write_bytes,
        read_count: counters.read_count,
        write_count: counters.write_count,
        read_time: counters.read_time,
        write_time: counters.write_time,
        read_speed: r.a,
        write_speed: r.b,
        read_speed_formatted: format_speed(r.a),
        write_speed_formatted: format_speed(r.b),
    }
}

pub fn collect(proc_root: &Path, rates: &RateTracker) -> MetricResult<DiskIoInfo> {
    let lines = hostfs::read_lines(&proc_root.join("diskstats")).map_err(|e| {
        warn!(error = %e, "disk I/O stats unreadable");
        MetricError::Unavailable("Disk I/O stats unavailable".into())
    })?;
    let counters = parse_diskstats(lines.iter().map(String::as_str))
        .ok_or_else(|| MetricError::Unavailable("No disk I/O counters available".into()))?;
    // advanced on every call, including the first
    let rate = rates.observe(counters.bytes());
    Ok(to_record(counters, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_and_virtual_devices_skipped() {
        assert!(is_counted_device("sda"));
        assert!(is_counted_device("nvme0n1"));
        assert!(is_counted_device("md0"));
        assert!(!is_counted_device("sda1"));
        assert!(!is_counted_device("nvme0n1p2"));
        assert!(!is_counted_device("mmcblk0p1"));
        assert!(is_counted_device("mmcblk0"));
        assert!(!is_counted_device("loop3"));
        assert!(!is_counted_device("dm-0"));
    }

    #[test]
    fn sums_whole_disks_in_bytes() {
        let text = "\
   8       0 sda 100 0 2000 30 50 0 1000 40 0 60 70 0 0 0 0
   8       1 sda1 90 0 1800 25 45 0 900 35 0 55 60 0 0 0 0
 259       0 nvme0n1 10 0 8 1 20 0 16 2 0 3 3
   7       0 loop0 5 0 10 0 0 0 0 0 0 0 0
";
        let c = parse_diskstats(text.lines()).unwrap();
        assert_eq!(c.read_count, 110);
        assert_eq!(c.write_count, 70);
        assert_eq!(c.read_bytes, (2000 + 8) * 512);
        assert_eq!(c.write_bytes, (1000 + 16) * 512);
        assert_eq!(c.read_time, 31);
        assert_eq!(c.write_time, 42);
    }

    #[test]
    fn only_virtual_devices_is_none() {
        let text = "   7       0 loop0 5 0 10 0 0 0 0 0 0 0 0\n";
        assert_eq!(parse_diskstats(text.lines()), None);
    }
}
