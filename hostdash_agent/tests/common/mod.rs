//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use hostdash_agent::config::AgentConfig;
use hostdash_agent::error::{MetricError, MetricResult};
use hostdash_agent::runner::CommandRunner;
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Canned command output keyed by the full command line. Anything not
/// registered behaves like a missing binary.
#[derive(Default)]
pub struct FakeRunner {
    responses: HashMap<String, MetricResult<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, cmdline: &str, out: MetricResult<String>) -> Self {
        self.responses.insert(cmdline.to_string(), out);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> impl Future<Output = MetricResult<String>> + Send {
        let key = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(key.clone());
        let out = self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(MetricError::NotFound(program.to_string())));
        async move { out }
    }
}

pub fn write(root: &Path, rel: &str, contents: &str) {
    let p = root.join(rel);
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(p, contents).unwrap();
}

/// Config whose host paths all live under `root`.
pub fn config_under(root: &Path) -> AgentConfig {
    let mut cfg = AgentConfig::default();
    cfg.paths.proc_root = root.join("proc");
    cfg.paths.host_proc_root = root.join("host/proc");
    cfg.paths.host_mnt = root.join("host/mnt");
    cfg.paths.sys_root = root.join("sys");
    cfg.paths.disks_ini = root.join("host/var/local/emhttp/disks.ini");
    cfg
}

pub const MEMINFO: &str = "\
MemTotal:       16000000 kB
MemFree:         4000000 kB
MemAvailable:    9000000 kB
Buffers:          500000 kB
Cached:          3000000 kB
SwapCached:            0 kB
Shmem:            200000 kB
Slab:             800000 kB
SReclaimable:     600000 kB
SwapTotal:       2000000 kB
SwapFree:        1500000 kB
";
