use std::sync::atomic::{AtomicUsize, Ordering};

use sysinfo::System;

/// 小批量直接串行的行数阈值
const SERIAL_THRESHOLD: usize = 32;

/// 自适应并行度：按系统负载与内存压力决定匹配线程池大小。
/// 仅在配置 workers = 0 时生效。
pub struct AdaptiveScheduler {
    target_parallelism: AtomicUsize,
    system: System,
}

impl AdaptiveScheduler {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            target_parallelism: AtomicUsize::new(num_cpus::get()),
            system: sys,
        }
    }

    /// 动态调整并行度
    pub fn adjust_parallelism(&mut self) -> usize {
        self.system.refresh_all();

        let load = System::load_average().one;
        let cpu_count = num_cpus::get() as f64;
        let mem_free = self.system.available_memory();
        let total_mem = self.system.total_memory();
        let mem_pressure = 1.0 - (mem_free as f64 / total_mem as f64);

        let new_parallelism = if load < cpu_count * 0.3 && mem_pressure < 0.5 {
            // 系统空闲：超线程激进
            (cpu_count * 2.0) as usize
        } else if load > cpu_count * 0.8 || mem_pressure > 0.8 {
            // 系统繁忙：保守降级
            ((cpu_count * 0.5) as usize).max(1)
        } else {
            // 正常负载：匹配核心数
            cpu_count as usize
        };

        let old = self
            .target_parallelism
            .swap(new_parallelism, Ordering::Relaxed);

        if old != new_parallelism {
            tracing::info!(
                "自适应并行度: {} -> {} (load: {:.2}, mem_pressure: {:.2})",
                old,
                new_parallelism,
                load,
                mem_pressure
            );
        }

        new_parallelism
    }

    /// 按待匹配行数选 worker 数：小批量串行省掉调度开销
    pub fn select_workers(&self, rows: usize) -> usize {
        if rows <= SERIAL_THRESHOLD {
            return 1;
        }
        self.target_parallelism.load(Ordering::Relaxed).max(1)
    }
}

impl Default for AdaptiveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_batches_run_serial() {
        let scheduler = AdaptiveScheduler::new();
        assert_eq!(scheduler.select_workers(1), 1);
        assert_eq!(scheduler.select_workers(SERIAL_THRESHOLD), 1);
    }

    #[test]
    fn large_batches_get_at_least_one_worker() {
        let mut scheduler = AdaptiveScheduler::new();
        scheduler.adjust_parallelism();
        assert!(scheduler.select_workers(10_000) >= 1);
    }
}
