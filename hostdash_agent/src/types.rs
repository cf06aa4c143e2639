//! Records served to the dashboard as JSON.
//! Keep this module minimal and stable; it defines the wire format.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CpuInfo {
    pub name: String,
    pub cores: Option<usize>,
    pub threads: usize,
    /// MHz
    pub frequency: Option<u64>,
    pub load_avg: Option<LoadAvg>,
    pub temperature: Option<f32>,
    pub usage: f32,
    pub per_cpu_usage: Vec<f32>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub percent: f64,
    pub system: u64,
    /// Heuristic: 1.5 x shared memory.
    pub vm: u64,
    /// Heuristic: 0.5 x slab.
    pub docker: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
    pub swap_percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiskIoInfo {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
    /// ms
    pub read_time: u64,
    /// ms
    pub write_time: u64,
    /// bytes/s
    pub read_speed: f64,
    pub write_speed: f64,
    pub read_speed_formatted: String,
    pub write_speed_formatted: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ActiveInterface {
    pub name: String,
    pub ipv4: Option<String>,
    /// Mbit/s as declared by the driver; 0 when unknown.
    pub speed: u64,
    pub mtu: u32,
    pub is_up: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NetworkInfo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errors_in: u64,
    pub errors_out: u64,
    pub drops_in: u64,
    pub drops_out: u64,
    pub active_interface: Option<ActiveInterface>,
    /// bytes/s since the previous sample
    pub current_sent: f64,
    pub current_recv: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PoolInfo {
    pub name: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct GpuInfo {
    pub name: String,
    // null when the driver reports `[N/A]` for that reading
    pub temperature: Option<f64>,
    pub utilization: Option<f64>,
    /// MiB
    pub memory_total: Option<f64>,
    pub memory_used: Option<f64>,
    pub memory_free: Option<f64>,
    pub memory_utilization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pci_bus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_graphics: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_memory: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_draw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_count: Option<usize>,
}

/// Friendly sensor label -> degrees C.
pub type Temperatures = BTreeMap<String, f64>;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_mb: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SystemInfo {
    pub hostname: String,
    pub platform: String,
    pub architecture: String,
    pub boot_time: String,
    pub uptime: String,
    pub kernel: String,
    pub load_avg: Option<LoadAvg>,
}
