//! Metrics facade: each collector behind its own TTL cache, with one uniform
//! `async fn domain(&self) -> MetricResult<Record>` per metric domain.

use crate::cache::Cached;
use crate::collectors::{cpu, disk_io, gpu, memory, network, pools, processes, system, temperature};
use crate::config::AgentConfig;
use crate::error::{MetricError, MetricResult};
use crate::rate::RateTracker;
use crate::runner::{CommandRunner, ProcessRunner};
use crate::types::{
    CpuInfo, DiskIoInfo, GpuInfo, MemoryInfo, NetworkInfo, PoolInfo, ProcessInfo, SystemInfo,
    Temperatures,
};
use sysinfo::{Components, CpuRefreshKind, Networks, RefreshKind, System};
use tokio::sync::Mutex;
use tracing::{debug, info};

struct Caches {
    system: Cached<MetricResult<SystemInfo>>,
    memory: Cached<MetricResult<MemoryInfo>>,
    cpu: Cached<MetricResult<CpuInfo>>,
    gpu: Cached<MetricResult<Vec<GpuInfo>>>,
    pools: Cached<MetricResult<Vec<PoolInfo>>>,
    network: Cached<MetricResult<NetworkInfo>>,
    disk_io: Cached<MetricResult<DiskIoInfo>>,
    temperatures: Cached<MetricResult<Temperatures>>,
    top_processes: Cached<MetricResult<Vec<ProcessInfo>>>,
}

impl Caches {
    fn new(cfg: &AgentConfig) -> Self {
        let t = &cfg.ttls;
        Self {
            system: Cached::new(t.system),
            memory: Cached::new(t.memory),
            cpu: Cached::new(t.cpu),
            gpu: Cached::new(t.gpu),
            pools: Cached::new(t.pools),
            network: Cached::new(t.network),
            disk_io: Cached::new(t.disk_io),
            temperatures: Cached::new(t.temperatures),
            top_processes: Cached::new(t.top_processes),
        }
    }
}

pub struct HostMetrics<R = ProcessRunner> {
    config: AgentConfig,
    runner: R,

    // Persistent sysinfo handles
    sys: Mutex<System>,
    components: Mutex<Components>,
    networks: Mutex<Networks>,

    disk_rate: RateTracker,
    net_rate: RateTracker,

    caches: Caches,
}

impl HostMetrics<ProcessRunner> {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: CommandRunner> HostMetrics<R> {
    pub fn with_runner(config: AgentConfig, runner: R) -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        info!(
            proc_root = %config.paths.proc_root.display(),
            host_proc_root = %config.paths.host_proc_root.display(),
            gpu = config.gpu_enabled,
            temp = config.temp_enabled,
            "metrics facade ready"
        );
        Self {
            caches: Caches::new(&config),
            config,
            runner,
            sys: Mutex::new(sys),
            components: Mutex::new(Components::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            disk_rate: RateTracker::new(),
            net_rate: RateTracker::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn disk_rate(&self) -> &RateTracker {
        &self.disk_rate
    }

    pub fn net_rate(&self) -> &RateTracker {
        &self.net_rate
    }

    pub async fn system_info(&self) -> MetricResult<SystemInfo> {
        self.caches.system.get_or_compute((), || async move { system::collect() }).await
    }

    pub async fn memory_info(&self) -> MetricResult<MemoryInfo> {
        let root = &self.config.paths.proc_root;
        self.caches.memory.get_or_compute((), || async move { memory::collect(root) }).await
    }

    pub async fn cpu_info(&self) -> MetricResult<CpuInfo> {
        let components = self.config.temp_enabled.then_some(&self.components);
        self.caches
            .cpu
            .get_or_compute((), || cpu::collect(&self.config.paths.proc_root, &self.sys, components))
            .await
    }

    /// Always a list; no GPU tool means an empty one. A missing tool is
    /// probed again once the cached empty list expires.
    pub async fn gpu_info(&self) -> MetricResult<Vec<GpuInfo>> {
        if !self.config.gpu_enabled {
            return Ok(Vec::new());
        }
        self.caches
            .gpu
            .get_or_compute((), || async move {
                match gpu::query_devices(&self.runner).await {
                    Ok(gpus) => Ok(gpus),
                    Err(MetricError::NotFound(_)) => {
                        debug!("{} not installed", gpu::GPU_TOOL);
                        Ok(Vec::new())
                    }
                    Err(e) => {
                        debug!(error = %e, "gpu query failed");
                        Ok(Vec::new())
                    }
                }
            })
            .await
    }

    pub async fn pools(&self) -> MetricResult<Vec<PoolInfo>> {
        let p = &self.config.paths;
        self.caches
            .pools
            .get_or_compute((), || async move {
                Ok(pools::collect(&self.runner, &p.host_mnt, &p.host_proc_root, &p.pool_root).await)
            })
            .await
    }

    pub async fn network(&self) -> MetricResult<NetworkInfo> {
        let p = &self.config.paths;
        self.caches
            .network
            .get_or_compute((), || {
                network::collect(&p.proc_root, &p.sys_root, &self.networks, &self.net_rate)
            })
            .await
    }

    pub async fn disk_io(&self) -> MetricResult<DiskIoInfo> {
        let root = &self.config.paths.proc_root;
        self.caches
            .disk_io
            .get_or_compute((), || async move { disk_io::collect(root, &self.disk_rate) })
            .await
    }

    pub async fn temperatures(&self) -> MetricResult<Temperatures> {
        if !self.config.temp_enabled {
            return Ok(Temperatures::new());
        }
        self.caches
            .temperatures
            .get_or_compute((), || async move {
                let sensors = {
                    let mut c = self.components.lock().await;
                    temperature::read_sensors(&mut c)
                };
                Ok(temperature::merge(&sensors, &self.config.paths.disks_ini))
            })
            .await
    }

    pub async fn top_processes(&self) -> MetricResult<Vec<ProcessInfo>> {
        let root = &self.config.paths.host_proc_root;
        self.caches
            .top_processes
            .get_or_compute((), || async move { Ok(processes::collect(root).await) })
            .await
    }
}
