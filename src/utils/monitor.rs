#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};
#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StageStats {
    pub stage: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
    pub cpu_usage: Option<f32>,
}

/// 單次請求的資源監控，每個 pipeline 階段結束時取樣一次
#[cfg(feature = "cli")]
pub struct RequestMonitor {
    system: Option<Mutex<(System, Pid)>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl RequestMonitor {
    pub fn new(enabled: bool) -> Self {
        let system = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new((System::new(), pid))),
                Err(e) => {
                    tracing::warn!("Process monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            system,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.system.is_some()
    }

    pub fn sample(&self, stage: &str) -> StageStats {
        let mut stats = StageStats {
            stage: stage.to_string(),
            elapsed: self.started.elapsed(),
            memory_usage_mb: None,
            cpu_usage: None,
        };

        if let Some(lock) = &self.system {
            if let Ok(mut guard) = lock.lock() {
                let (system, pid) = &mut *guard;
                let pid = *pid;
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                if let Some(process) = system.process(pid) {
                    stats.memory_usage_mb = Some(process.memory() / 1024 / 1024);
                    stats.cpu_usage = Some(process.cpu_usage());
                }
            }
        }

        stats
    }

    pub fn log_stage(&self, stage: &str) {
        if !self.is_enabled() {
            return;
        }
        let stats = self.sample(stage);
        tracing::info!(
            "📊 {} - CPU: {:.1}%, Memory: {}MB, Time: {:?}",
            stats.stage,
            stats.cpu_usage.unwrap_or_default(),
            stats.memory_usage_mb.unwrap_or_default(),
            stats.elapsed
        );
    }
}

// 非 CLI 建置只保留計時
#[cfg(not(feature = "cli"))]
pub struct RequestMonitor {
    started: Instant,
}

#[cfg(not(feature = "cli"))]
impl RequestMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn sample(&self, stage: &str) -> StageStats {
        StageStats {
            stage: stage.to_string(),
            elapsed: self.started.elapsed(),
            memory_usage_mb: None,
            cpu_usage: None,
        }
    }

    pub fn log_stage(&self, _stage: &str) {}
}
