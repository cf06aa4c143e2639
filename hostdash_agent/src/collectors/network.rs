//! Network counters (`/proc/net/dev`) and the "active" physical interface.

use crate::error::{MetricError, MetricResult};
use crate::hostfs;
use crate::rate::{CounterPair, RatePair, RateTracker};
use crate::types::{ActiveInterface, NetworkInfo};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use sysinfo::Networks;
use tokio::sync::Mutex;
use tracing::warn;

const IFF_UP: u32 = 0x1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub bytes_recv: u64,
    pub packets_recv: u64,
    pub errors_in: u64,
    pub drops_in: u64,
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub errors_out: u64,
    pub drops_out: u64,
}

impl NetCounters {
    /// (sent, received) bytes.
    pub fn bytes(&self) -> CounterPair {
        CounterPair::new(self.bytes_sent, self.bytes_recv)
    }
}

/// Everything known about one interface before selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCandidate {
    pub name: String,
    pub ipv4: Option<String>,
    pub speed: u64,
    pub mtu: u32,
    pub is_up: bool,
}

/// Loopback, docker bridges, veth pairs and libvirt bridges.
pub fn is_virtual_interface(name: &str) -> bool {
    name == "lo"
        || ["docker", "br-", "veth", "virbr"]
            .iter()
            .any(|p| name.starts_with(p))
}

/// Totals over all interfaces plus the interface names, in file order.
pub fn parse_net_dev<'a, I>(lines: I) -> (NetCounters, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = NetCounters::default();
    let mut names = Vec::new();
    for line in lines {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let v: Vec<u64> = rest
            .split_whitespace()
            .map(|t| t.parse().unwrap_or(0))
            .collect();
        if v.len() < 12 {
            continue;
        }
        total.bytes_recv += v[0];
        total.packets_recv += v[1];
        total.errors_in += v[2];
        total.drops_in += v[3];
        total.bytes_sent += v[8];
        total.packets_sent += v[9];
        total.errors_out += v[10];
        total.drops_out += v[11];
        names.push(name.trim().to_string());
    }
    (total, names)
}

/// Highest declared link speed among physical interfaces that are up and
/// carry an IPv4 address; the earlier candidate wins a tie.
pub fn select_active(candidates: &[InterfaceCandidate]) -> Option<ActiveInterface> {
    let mut best: Option<&InterfaceCandidate> = None;
    for c in candidates {
        if is_virtual_interface(&c.name) || !c.is_up || c.ipv4.is_none() {
            continue;
        }
        if best.is_none_or(|b| c.speed > b.speed) {
            best = Some(c);
        }
    }
    best.map(|c| ActiveInterface {
        name: c.name.clone(),
        ipv4: c.ipv4.clone(),
        speed: c.speed,
        mtu: c.mtu,
        is_up: c.is_up,
    })
}

/// Link state from sysfs: `flags` (hex), `speed` (Mbit/s, -1 when unknown)
/// and `mtu`.
pub fn read_link(sys_root: &Path, name: &str, ipv4: Option<String>) -> InterfaceCandidate {
    let dir = sys_root.join("class/net").join(name);
    let flags = hostfs::read_trimmed(&dir.join("flags"))
        .and_then(|s| u32::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .unwrap_or(0);
    let speed = hostfs::read_trimmed(&dir.join("speed"))
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|s| u64::try_from(s).ok())
        .unwrap_or(0);
    let mtu = hostfs::read_trimmed(&dir.join("mtu"))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    InterfaceCandidate {
        name: name.to_string(),
        ipv4,
        speed,
        mtu,
        is_up: flags & IFF_UP != 0,
    }
}

async fn ipv4_addresses(networks: &Mutex<Networks>) -> HashMap<String, String> {
    let mut nets = networks.lock().await;
    nets.refresh(true);
    nets.iter()
        .filter_map(|(name, data)| {
            data.ip_networks().iter().find_map(|ip| match ip.addr {
                IpAddr::V4(v4) => Some((name.clone(), v4.to_string())),
                IpAddr::V6(_) => None,
            })
        })
        .collect()
}

pub fn to_record(
    counters: NetCounters,
    active_interface: Option<ActiveInterface>,
    r: RatePair,
) -> NetworkInfo {
    NetworkInfo {
        bytes_sent: counters.bytes_sent,
        bytes_recv: counters.bytes_recv,
        packets_sent: counters.packets_sent,
        packets_recv: counters.packets_recv,
        errors_in: counters.errors_in,
        errors_out: counters.errors_out,
        drops_in: counters.drops_in,
        drops_out: counters.drops_out,
        active_interface,
        current_sent: r.a,
        current_recv: r.b,
    }
}

pub async fn collect(
    proc_root: &Path,
    sys_root: &Path,
    networks: &Mutex<Networks>,
    rates: &RateTracker,
) -> MetricResult<NetworkInfo> {
    let lines = hostfs::read_lines(&proc_root.join("net/dev")).map_err(|e| {
        warn!(error = %e, "network counters unreadable");
        MetricError::Unavailable(format!("Network counters unavailable: {e}"))
    })?;
    let (counters, mut names) = parse_net_dev(lines.iter().map(String::as_str));
    names.sort();

    let mut addrs = ipv4_addresses(networks).await;
    let candidates: Vec<InterfaceCandidate> = names
        .iter()
        .filter(|n| !is_virtual_interface(n))
        .map(|n| read_link(sys_root, n, addrs.remove(n)))
        .collect();

    let rate = rates.observe(counters.bytes());
    Ok(to_record(counters, select_active(&candidates), rate))
}
