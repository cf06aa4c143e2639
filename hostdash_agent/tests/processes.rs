//! Top processes from a fake host process table.
mod common;

use hostdash_agent::collectors::processes::{collect, is_excluded_process, rank, ProcSample, TOP_N};
use std::path::Path;

fn stat_line(pid: u32, comm: &str, utime: u64, stime: u64) -> String {
    format!("{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194560 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 100 1000 200\n")
}

fn sample(pid: u32, name: &str, before: u64, after: u64, rss: u64) -> ProcSample {
    ProcSample {
        pid,
        name: name.to_string(),
        jiffies_before: before,
        jiffies_after: after,
        rss_bytes: rss,
    }
}

#[test]
fn runtime_and_self_names_are_excluded() {
    for name in ["dockerd", "containerd", "containerd-shim", "runc", "hostdash_agent", "Docker-Proxy"] {
        assert!(is_excluded_process(name), "{name}");
    }
    for name in ["nginx", "postgres", "smbd", "qemu-system-x86"] {
        assert!(!is_excluded_process(name), "{name}");
    }
}

#[test]
fn ranking_orders_by_cpu_and_caps_at_top_n() {
    let mut samples: Vec<ProcSample> = (1..=15)
        .map(|i| sample(i, &format!("worker{i}"), 0, u64::from(i), 1024 * 1024))
        .collect();
    samples.push(sample(99, "containerd", 0, 1000, 0));

    let top = rank(samples, 100, 100 * 1024 * 1024);
    assert_eq!(top.len(), TOP_N);
    assert_eq!(top[0].pid, 15);
    assert_eq!(top[0].cpu_percent, 15.0);
    assert!(top.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    assert!(top.iter().all(|p| p.name != "containerd"));
    assert!((top[0].memory_percent - 1.0).abs() < 1e-9);
    assert!((top[0].memory_mb - 1.0).abs() < 1e-9);
}

#[test]
fn cpu_percent_is_clamped() {
    let top = rank(vec![sample(1, "burn", 0, 500, 0), sample(2, "back", 10, 5, 0)], 100, 0);
    assert_eq!(top[0].cpu_percent, 100.0);
    assert_eq!(top[1].cpu_percent, 0.0);
    assert_eq!(top[1].memory_percent, 0.0);
}

#[test]
fn unknown_machine_totals_give_no_cpu_share() {
    let top = rank(vec![sample(1, "nginx", 0, 1, 0), sample(2, "sshd", 0, 40, 0)], 0, 0);
    assert_eq!(top.len(), 2);
    assert!(top.iter().all(|p| p.cpu_percent == 0.0));
}

#[tokio::test]
async fn missing_cpu_totals_keep_processes_without_cpu_share() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    common::write(root, "meminfo", common::MEMINFO);
    for (pid, name) in [(200u32, "nginx"), (201, "postgres")] {
        common::write(root, &format!("{pid}/stat"), &stat_line(pid, name, 50, 50));
        common::write(root, &format!("{pid}/status"), &format!("Name:\t{name}\nVmRSS:\t   1024 kB\n"));
    }

    let top = collect(root).await;
    assert_eq!(top.len(), 2);
    assert!(top.iter().all(|p| p.cpu_percent == 0.0));
    assert!(top.iter().all(|p| (p.memory_mb - 1.0).abs() < 1e-9));
}

#[tokio::test]
async fn end_to_end_excludes_runtime_and_returns_at_most_ten() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    common::write(root, "stat", "cpu  100 0 100 1000 0 0 0 0 0 0\n");
    common::write(root, "meminfo", common::MEMINFO);

    let names = [
        "dockerd", "containerd-shim", "hostdash_agent", "runc", "nginx", "postgres", "smbd",
        "sshd", "cron", "qemu", "nfsd", "rsyslogd", "udevd", "bash",
    ];
    for (i, name) in names.iter().enumerate() {
        let pid = 100 + i as u32;
        common::write(root, &format!("{pid}/stat"), &stat_line(pid, name, 10, 5));
        common::write(root, &format!("{pid}/status"), &format!("Name:\t{name}\nVmRSS:\t   16000 kB\n"));
    }
    // vanished between listing and reading
    std::fs::create_dir_all(root.join("4242")).unwrap();
    // not a pid
    common::write(root, "self/stat", &stat_line(1, "self", 0, 0));

    let top = collect(root).await;
    assert_eq!(top.len(), 10);
    assert!(top.iter().all(|p| !is_excluded_process(&p.name)));
    assert!(top.iter().all(|p| p.pid != 4242));
    assert!(top.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    let nginx_mb = top.iter().find(|p| p.name == "nginx").map(|p| p.memory_mb);
    assert!(nginx_mb.is_some_and(|mb| (mb - 15.625).abs() < 1e-9));
}

#[tokio::test]
async fn unreadable_table_is_empty() {
    assert!(collect(Path::new("/nonexistent/host/proc")).await.is_empty());
}
