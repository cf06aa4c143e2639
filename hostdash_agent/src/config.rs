//! Agent configuration: host mount paths, per-domain cache TTLs and toggles.
//! Read once at startup from `HOSTDASH_*` environment variables and argv.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 5000;

/// Where host state is read from. Inside a container these are the
/// read-only bind mounts of the host's `/proc`, `/mnt` and so on.
#[derive(Debug, Clone)]
pub struct HostPaths {
    pub proc_root: PathBuf,
    pub host_proc_root: PathBuf,
    pub host_mnt: PathBuf,
    pub pool_root: PathBuf,
    pub sys_root: PathBuf,
    pub disks_ini: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            host_proc_root: PathBuf::from("/host/proc"),
            host_mnt: PathBuf::from("/host/mnt"),
            pool_root: PathBuf::from("/mnt"),
            sys_root: PathBuf::from("/sys"),
            disks_ini: PathBuf::from("/host/var/local/emhttp/disks.ini"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub system: Duration,
    pub memory: Duration,
    pub cpu: Duration,
    pub gpu: Duration,
    pub pools: Duration,
    pub network: Duration,
    pub disk_io: Duration,
    pub temperatures: Duration,
    pub top_processes: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        let secs = Duration::from_secs;
        Self {
            system: secs(2),
            memory: secs(2),
            cpu: secs(2),
            gpu: secs(2),
            pools: secs(5),
            network: secs(2),
            disk_io: secs(1),
            temperatures: secs(2),
            top_processes: secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub paths: HostPaths,
    pub ttls: CacheTtls,
    pub gpu_enabled: bool,
    pub temp_enabled: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            paths: HostPaths::default(),
            ttls: CacheTtls::default(),
            gpu_enabled: true,
            temp_enabled: true,
        }
    }
}

impl AgentConfig {
    /// Build from the process environment and command line.
    pub fn load() -> Self {
        let mut cfg = Self::from_env();
        cfg.port = parse_port(std::env::args(), cfg.port);
        cfg
    }

    pub fn from_env() -> Self {
        let d = Self::default();
        let path = |key: &str, default: PathBuf| {
            std::env::var_os(key).map(PathBuf::from).unwrap_or(default)
        };
        let paths = HostPaths {
            proc_root: path("HOSTDASH_PROC_ROOT", d.paths.proc_root),
            host_proc_root: path("HOSTDASH_HOST_PROC_ROOT", d.paths.host_proc_root),
            host_mnt: path("HOSTDASH_HOST_MNT", d.paths.host_mnt),
            pool_root: path("HOSTDASH_POOL_ROOT", d.paths.pool_root),
            sys_root: path("HOSTDASH_SYS_ROOT", d.paths.sys_root),
            disks_ini: path("HOSTDASH_DISKS_INI", d.paths.disks_ini),
        };
        let t = d.ttls;
        let ttls = CacheTtls {
            system: env_ttl("HOSTDASH_SYSTEM_TTL_MS", t.system),
            memory: env_ttl("HOSTDASH_MEMORY_TTL_MS", t.memory),
            cpu: env_ttl("HOSTDASH_CPU_TTL_MS", t.cpu),
            gpu: env_ttl("HOSTDASH_GPU_TTL_MS", t.gpu),
            pools: env_ttl("HOSTDASH_POOLS_TTL_MS", t.pools),
            network: env_ttl("HOSTDASH_NETWORK_TTL_MS", t.network),
            disk_io: env_ttl("HOSTDASH_DISK_IO_TTL_MS", t.disk_io),
            temperatures: env_ttl("HOSTDASH_TEMPERATURES_TTL_MS", t.temperatures),
            top_processes: env_ttl("HOSTDASH_TOP_PROCESSES_TTL_MS", t.top_processes),
        };
        Self {
            bind: env_parse("HOSTDASH_BIND", d.bind),
            port: env_parse("HOSTDASH_PORT", d.port),
            paths,
            ttls,
            gpu_enabled: env_flag("HOSTDASH_GPU", d.gpu_enabled),
            temp_enabled: env_flag("HOSTDASH_TEMP", d.temp_enabled),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(v) => v.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

fn env_ttl(key: &str, default: Duration) -> Duration {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(env_parse(key, default_ms))
}

// Anything but "0" enables.
fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v.trim() != "0").unwrap_or(default)
}

/// Port from `--port N`, `--port=N` or `-p N`; the long form wins.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_refresh_budget() {
        let t = CacheTtls::default();
        assert_eq!(t.disk_io, Duration::from_secs(1));
        assert_eq!(t.pools, Duration::from_secs(5));
        assert_eq!(t.top_processes, Duration::from_secs(5));
        assert_eq!(t.cpu, Duration::from_secs(2));
    }

    #[test]
    fn bad_port_falls_back() {
        let args = vec!["agent".to_string(), "--port".into(), "http".into()];
        assert_eq!(parse_port(args, 5000), 5000);
    }
}
