//! CPU identification from cpuinfo, and a full sample over a fake proc root.
mod common;

use hostdash_agent::collectors::cpu::{self, model_name, normalize_cpu_name, physical_core_count};
use hostdash_agent::metrics::HostMetrics;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tokio::sync::Mutex;

#[test]
fn trademark_glyphs_and_spacing() {
    assert_eq!(normalize_cpu_name("Intel(R) Core(TM) i7"), "Intel® Core™ i7");
    assert_eq!(
        normalize_cpu_name("  Intel(R)  Xeon(R) CPU   E5-2680 v4 @ 2.40GHz "),
        "Intel® Xeon® CPU E5-2680 v4 @ 2.40GHz"
    );
    assert!(!normalize_cpu_name("AMD Ryzen 9 5950X 16-Core Processor\t").contains("  "));
}

const CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
physical id\t: 0
core id\t\t: 0

processor\t: 1
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
physical id\t: 0
core id\t\t: 1

processor\t: 2
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
physical id\t: 0
core id\t\t: 0

processor\t: 3
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
physical id\t: 0
core id\t\t: 1
";

#[test]
fn model_name_from_first_entry() {
    assert_eq!(
        model_name(CPUINFO.lines()).as_deref(),
        Some("Intel® Core™ i7-8700K CPU @ 3.70GHz")
    );
    assert_eq!(model_name("processor : 0\nBogoMIPS : 50\n".lines()), None);
}

#[test]
fn physical_cores_from_topology() {
    assert_eq!(physical_core_count(CPUINFO.lines()), Some(2));
    assert_eq!(physical_core_count("processor : 0\n".lines()), None);

    let two_sockets = "physical id : 0\ncore id : 0\nphysical id : 1\ncore id : 0\n";
    assert_eq!(physical_core_count(two_sockets.lines()), Some(2));
}

#[tokio::test]
async fn sample_without_topology_lines() {
    let dir = tempfile::tempdir().unwrap();
    common::write(
        dir.path(),
        "proc/cpuinfo",
        "processor\t: 0\nmodel name\t: ARMv8 Processor rev 1 (v8l)\n\nprocessor\t: 1\nmodel name\t: ARMv8 Processor rev 1 (v8l)\n",
    );
    let sys = Mutex::new(System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
    ));

    let info = cpu::collect(&dir.path().join("proc"), &sys, None).await.unwrap();
    assert_eq!(info.name, "ARMv8 Processor rev 1 (v8l)");
    assert_eq!(info.cores, System::physical_core_count());
    assert!(info.threads > 0);
    assert_eq!(info.per_cpu_usage.len(), info.threads);
    assert!(info.per_cpu_usage.iter().all(|u| (0.0..=100.0).contains(u)));
    assert!((0.0..=100.0).contains(&info.usage));
    assert_eq!(info.temperature, None);
}

#[tokio::test]
async fn facade_sample_with_temperatures_disabled() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "proc/cpuinfo", CPUINFO);
    let mut cfg = common::config_under(dir.path());
    cfg.temp_enabled = false;
    let m = HostMetrics::with_runner(cfg, common::FakeRunner::new());

    let info = m.cpu_info().await.unwrap();
    assert_eq!(info.name, "Intel® Core™ i7-8700K CPU @ 3.70GHz");
    assert_eq!(info.cores, Some(2));
    assert_eq!(info.temperature, None);
    assert_eq!(info.per_cpu_usage.len(), info.threads);
    assert!(info.per_cpu_usage.iter().all(|u| (0.0..=100.0).contains(u)));

    // second call inside the TTL skips the sampling window
    let started = std::time::Instant::now();
    assert_eq!(m.cpu_info().await.unwrap(), info);
    assert!(started.elapsed() < cpu::CPU_SAMPLE_WINDOW);
}
