#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

/// Logs process CPU and memory at named phases (load, render, export).
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    peak_memory_mb: Mutex<u64>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(pid),
                Err(e) => {
                    tracing::warn!("⚠️ Process monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut system = System::new();
        if enabled {
            system.refresh_all();
        }

        Self {
            system: Mutex::new(system),
            pid,
            started: Instant::now(),
            peak_memory_mb: Mutex::new(0),
            enabled,
        }
    }

    pub fn stats(&self) -> Option<PhaseStats> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_all();

        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;

        let mut peak = self.peak_memory_mb.lock().ok()?;
        *peak = (*peak).max(memory_mb);

        Some(PhaseStats {
            cpu_usage: process.cpu_usage(),
            memory_mb,
            peak_memory_mb: *peak,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.elapsed
            );
        }
    }

    pub fn log_final(&self) {
        if let Some(stats) = self.stats() {
            tracing::info!(
                "📊 Final - Total time: {:?}, Peak memory: {}MB",
                stats.elapsed,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Library builds without the cli feature get a no-op monitor.
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_final(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        monitor.log_phase("load");
        monitor.log_final();
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_disabled_monitor_has_no_stats() {
        assert!(SystemMonitor::default().stats().is_none());
    }
}
