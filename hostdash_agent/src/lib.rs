//! Host metrics sampling and caching for a dashboard UI.
//!
//! Collectors read the host's `/proc`, sysfs, mount table and vendor tools;
//! [`metrics::HostMetrics`] puts each behind a short TTL cache and
//! [`http::router`] exposes them as JSON.

pub mod cache;
pub mod collectors;
pub mod config;
pub mod error;
pub mod hostfs;
pub mod http;
pub mod metrics;
pub mod rate;
pub mod runner;
pub mod state;
pub mod types;
