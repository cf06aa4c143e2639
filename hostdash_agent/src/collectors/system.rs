//! Host identity and uptime.

use crate::collectors::load_average;
use crate::error::{MetricError, MetricResult};
use crate::types::SystemInfo;
use std::time::{SystemTime, UNIX_EPOCH};
use sysinfo::System;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// `Xd Yh Zm` from one day on, `Yh Zm Ss` below that.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m {seconds}s")
    }
}

pub fn format_boot_time(boot_unix: u64) -> MetricResult<String> {
    let ts = i64::try_from(boot_unix)
        .map_err(|_| MetricError::ParseFailure(format!("boot time {boot_unix}")))?;
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .ok_or_else(|| MetricError::ParseFailure(format!("boot time {boot_unix}")))
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|s| s.into_string().ok())
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown".into())
}

pub fn collect() -> MetricResult<SystemInfo> {
    let boot = System::boot_time();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(boot);
    let kernel = System::kernel_version().unwrap_or_else(|| "unknown".into());
    let architecture = std::env::consts::ARCH.to_string();
    let os = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());

    Ok(SystemInfo {
        hostname: hostname(),
        platform: format!("{os}-{kernel}-{architecture}"),
        architecture,
        boot_time: format_boot_time(boot)?,
        uptime: format_uptime(now.saturating_sub(boot)),
        kernel,
        load_avg: load_average(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_time_is_rfc3339_utc() {
        assert_eq!(format_boot_time(0).unwrap(), "1970-01-01T00:00:00Z");
    }
}
