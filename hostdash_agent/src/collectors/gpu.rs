//! NVIDIA GPUs via `nvidia-smi`. A missing tool means "no GPU", not an error.

use crate::error::MetricResult;
use crate::runner::CommandRunner;
use crate::types::GpuInfo;
use std::time::Duration;
use tracing::{debug, warn};

pub const GPU_TOOL: &str = "nvidia-smi";

const PRIMARY_TIMEOUT: Duration = Duration::from_secs(10);
const SECONDARY_TIMEOUT: Duration = Duration::from_secs(5);

const PRIMARY_FIELDS: &str = "--query-gpu=name,temperature.gpu,utilization.gpu,memory.total,memory.used,memory.free,utilization.memory";
const CSV: &str = "--format=csv,noheader,nounits";

fn fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// One device line of the primary query. A non-numeric reading (e.g.
/// `[N/A]` for memory utilization on MIG devices) leaves that field empty;
/// only a short line or a missing name rejects the device.
pub fn parse_primary_line(line: &str) -> Option<GpuInfo> {
    let p = fields(line);
    if p.len() < 7 || p[0].is_empty() {
        return None;
    }
    let num = |i: usize| p[i].parse::<f64>().ok();
    Some(GpuInfo {
        name: p[0].to_string(),
        temperature: num(1),
        utilization: num(2),
        memory_total: num(3),
        memory_used: num(4),
        memory_free: num(5),
        memory_utilization: num(6),
        ..GpuInfo::default()
    })
}

/// First line of a two-column secondary query.
fn pair(output: &str) -> Option<(String, String)> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let p = fields(line);
    (p.len() >= 2).then(|| (p[0].to_string(), p[1].to_string()))
}

fn num_pair(output: &str) -> Option<(f64, f64)> {
    let (a, b) = pair(output)?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

pub fn count_compute_apps(output: &str) -> usize {
    output.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Secondary queries for device `index`. Each one fills its own fields and
/// may fail on its own.
async fn enrich<R: CommandRunner>(runner: &R, index: usize, gpu: &mut GpuInfo) {
    let idx = index.to_string();
    let query = |q: &'static str, format: &'static str| {
        let idx = idx.clone();
        async move {
            match runner.run(GPU_TOOL, &[q, format, "-i", &idx], SECONDARY_TIMEOUT).await {
                Ok(out) => Some(out),
                Err(e) => {
                    debug!(query = q, error = %e, "gpu secondary query failed");
                    None
                }
            }
        }
    };

    if let Some((driver, bus)) = query("--query-gpu=driver_version,pci.bus_id", CSV)
        .await
        .as_deref()
        .and_then(pair)
    {
        gpu.driver_version = Some(driver);
        gpu.pci_bus = Some(bus);
    }
    if let Some((gr, mem)) = query("--query-gpu=clocks.gr,clocks.mem", CSV)
        .await
        .as_deref()
        .and_then(num_pair)
    {
        gpu.clock_graphics = Some(gr);
        gpu.clock_memory = Some(mem);
    }
    if let Some((draw, limit)) = query("--query-gpu=power.draw,power.limit", CSV)
        .await
        .as_deref()
        .and_then(num_pair)
    {
        gpu.power_draw = Some(draw);
        gpu.power_limit = Some(limit);
    }
    gpu.process_count = query("--query-compute-apps=pid", "--format=csv,noheader")
        .await
        .as_deref()
        .map(count_compute_apps);
}

/// Primary query plus per-device enrichment. Fails only when the primary
/// query itself fails (tool missing, timeout, non-zero exit).
pub async fn query_devices<R: CommandRunner>(runner: &R) -> MetricResult<Vec<GpuInfo>> {
    let out = runner.run(GPU_TOOL, &[PRIMARY_FIELDS, CSV], PRIMARY_TIMEOUT).await?;

    let mut gpus = Vec::new();
    for (index, line) in out.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let Some(mut gpu) = parse_primary_line(line) else {
            warn!(line, "unparseable gpu line");
            continue;
        };
        enrich(runner, index, &mut gpu).await;
        gpus.push(gpu);
    }
    Ok(gpus)
}
