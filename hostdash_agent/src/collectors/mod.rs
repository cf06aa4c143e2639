//! One collector per metric domain. Each turns current host state into a
//! record or a [`MetricError`](crate::error::MetricError); none of them
//! depends on another's output.

pub mod cpu;
pub mod disk_io;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod pools;
pub mod processes;
pub mod system;
pub mod temperature;

use crate::types::LoadAvg;

/// 1/5/15-minute load; absent where the platform has no such concept.
pub fn load_average() -> Option<LoadAvg> {
    #[cfg(unix)]
    {
        let l = sysinfo::System::load_average();
        Some(LoadAvg {
            one: l.one,
            five: l.five,
            fifteen: l.fifteen,
        })
    }
    #[cfg(not(unix))]
    {
        None
    }
}
