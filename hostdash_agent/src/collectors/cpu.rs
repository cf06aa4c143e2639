//! CPU identity, frequency, load and utilization.

use crate::collectors::{load_average, temperature};
use crate::error::MetricResult;
use crate::hostfs;
use crate::types::CpuInfo;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Components, CpuRefreshKind, System};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

/// Utilization is averaged over this window. The cache-miss path therefore
/// always takes at least this long.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// `(R)`/`(TM)` become their glyphs, whitespace runs collapse to one space.
pub fn normalize_cpu_name(raw: &str) -> String {
    raw.replace("(R)", "®")
        .replace("(TM)", "™")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `model name` entry of a cpuinfo listing.
pub fn model_name<'a, I>(cpuinfo: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    cpuinfo
        .into_iter()
        .filter(|l| l.starts_with("model name"))
        .find_map(|l| l.split_once(':').map(|(_, v)| v.trim()))
        .filter(|v| !v.is_empty())
        .map(normalize_cpu_name)
}

/// Distinct (physical id, core id) pairs; `None` when the listing carries no
/// topology (some ARM kernels).
pub fn physical_core_count<'a, I>(cpuinfo: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut package = String::new();
    let mut cores = HashSet::new();
    for line in cpuinfo {
        let Some((k, v)) = line.split_once(':') else {
            continue;
        };
        match k.trim() {
            "physical id" => package = v.trim().to_string(),
            "core id" => {
                cores.insert((package.clone(), v.trim().to_string()));
            }
            _ => {}
        }
    }
    (!cores.is_empty()).then_some(cores.len())
}

pub async fn collect(
    proc_root: &Path,
    sys: &Mutex<System>,
    components: Option<&Mutex<Components>>,
) -> MetricResult<CpuInfo> {
    let cpuinfo = match hostfs::read_to_string(&proc_root.join("cpuinfo")) {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, "cpuinfo unreadable, using library fallback");
            String::new()
        }
    };

    let (usage, per_cpu_usage, frequency, brand) = {
        let mut sys = sys.lock().await;
        sys.refresh_cpu_usage();
        sleep(CPU_SAMPLE_WINDOW).await;
        sys.refresh_cpu_specifics(CpuRefreshKind::nothing().with_cpu_usage().with_frequency());
        let per: Vec<f32> = sys.cpus().iter().map(|c| c.cpu_usage().clamp(0.0, 100.0)).collect();
        let first = sys.cpus().first();
        (
            sys.global_cpu_usage().clamp(0.0, 100.0),
            per,
            first.map(|c| c.frequency()).filter(|&f| f > 0),
            first.map(|c| c.brand().to_string()).unwrap_or_default(),
        )
    };

    let temperature = match components {
        Some(c) => {
            let mut c = c.lock().await;
            temperature::cpu_temperature(&temperature::read_sensors(&mut c))
        }
        None => None,
    };

    Ok(CpuInfo {
        name: model_name(cpuinfo.lines()).unwrap_or_else(|| normalize_cpu_name(&brand)),
        cores: physical_core_count(cpuinfo.lines()).or_else(System::physical_core_count),
        threads: per_cpu_usage.len(),
        frequency,
        load_avg: load_average(),
        temperature,
        usage,
        per_cpu_usage,
    })
}
