//! System memory monitor
//!
//! sysinfo-backed implementation of the `MemoryPressure` port used by the
//! crawl dispatcher. Refreshes are rate-limited behind a mutex so frequent
//! polling stays cheap.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use sysinfo::System;

use ccx_domain::ports::MemoryPressure;

/// Minimum interval between refreshes
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

struct MonitorState {
    system: System,
    last_refresh: Instant,
    cached_percent: f32,
}

/// Memory monitor over sysinfo
pub struct SysinfoMemoryMonitor {
    state: Mutex<MonitorState>,
}

impl SysinfoMemoryMonitor {
    /// Create a monitor
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        let cached_percent = percent_of(&system);
        Self {
            state: Mutex::new(MonitorState {
                system,
                last_refresh: Instant::now(),
                cached_percent,
            }),
        }
    }
}

impl Default for SysinfoMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn percent_of(system: &System) -> f32 {
    let total = system.total_memory();
    if total == 0 {
        return 0.0;
    }
    (system.used_memory() as f32 / total as f32) * 100.0
}

impl MemoryPressure for SysinfoMemoryMonitor {
    fn used_percent(&self) -> f32 {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.last_refresh.elapsed() >= REFRESH_INTERVAL {
            state.system.refresh_memory();
            state.cached_percent = percent_of(&state.system);
            state.last_refresh = Instant::now();
        }
        state.cached_percent
    }
}

/// Fixed-value monitor for tests and configuration overrides
pub struct StaticMemoryMonitor {
    percent: f32,
}

impl StaticMemoryMonitor {
    /// Report a constant used-memory percentage
    pub fn new(percent: f32) -> Self {
        Self { percent }
    }
}

impl MemoryPressure for StaticMemoryMonitor {
    fn used_percent(&self) -> f32 {
        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_percent_is_a_percentage() {
        let monitor = SysinfoMemoryMonitor::new();
        let percent = monitor.used_percent();
        assert!((0.0..=100.0).contains(&percent));
    }

    #[test]
    fn static_monitor_reports_its_value() {
        let monitor = StaticMemoryMonitor::new(42.5);
        assert!((monitor.used_percent() - 42.5).abs() < f32::EPSILON);
    }
}
