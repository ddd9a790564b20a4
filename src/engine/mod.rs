pub mod adaptive;
pub mod batch;

pub use adaptive::AdaptiveScheduler;
pub use batch::{match_batch, match_batch_with, AcceptedMatch};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::config::MatchConfig;
use crate::core::MatchedPair;
use crate::index::{build_index, AddressIndex};
use crate::stats::{CacheStats, EngineStats, RunReport, StageTimings};
use crate::store::AddressStore;

#[derive(Debug, Error)]
pub enum RunError {
    /// 整轮匹配（含索引重建）必须串行，重建本身没有内部锁
    #[error("上一轮匹配尚未结束")]
    RunInProgress,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 匹配引擎：独占持有当前索引（含缓存）。
///
/// 重建产出全新的 `AddressIndex` 并原子切换（ArcSwap），在途读者继续
/// 使用旧索引直至读完，旧索引随最后一个引用整体释放。
pub struct MatchEngine {
    store: Arc<AddressStore>,
    index: ArcSwap<AddressIndex>,
    scheduler: Mutex<AdaptiveScheduler>,
    run_lock: Mutex<()>,
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(store: Arc<AddressStore>, config: MatchConfig) -> Self {
        Self {
            store,
            index: ArcSwap::from_pointee(AddressIndex::empty()),
            scheduler: Mutex::new(AdaptiveScheduler::new()),
            run_lock: Mutex::new(()),
            config,
        }
    }

    pub fn store(&self) -> &Arc<AddressStore> {
        &self.store
    }

    /// 当前索引快照。重建期间旧索引继续服务读者。
    pub fn current_index(&self) -> Arc<AddressIndex> {
        self.index.load_full()
    }

    /// 从标准地址表整体重建索引并原子切换。
    /// 新索引自带空缓存，等价于在切换时机整体清缓存。
    pub fn rebuild_index(&self) -> Arc<AddressIndex> {
        let canonical = self.store.canonical_snapshot();
        let rebuilt = Arc::new(build_index(&canonical));
        self.index.store(rebuilt.clone());
        maybe_trim_rss();
        rebuilt
    }

    /// 一轮完整匹配：清历史 → 加载 → 重建索引 → 并行匹配 → 批量落库。
    /// 并发调用被拒绝（try-lock），保证重建不会与在途匹配交叠。
    pub fn run_full_match(&self) -> Result<RunReport, RunError> {
        let _guard = self.run_lock.try_lock().ok_or(RunError::RunInProgress)?;

        let total_started = Instant::now();
        tracing::info!("=== 开始地址匹配 ===");

        // 阶段1：清空上一轮结果
        let stage = Instant::now();
        self.store.clear_run_results();
        let clear_ms = elapsed_ms(stage);
        tracing::info!("阶段1-清空数据: {}ms", clear_ms);

        // 阶段2：加载数据
        let stage = Instant::now();
        let canonical = self.store.canonical_snapshot();
        let secondary = self.store.secondary_snapshot();
        let load_ms = elapsed_ms(stage);
        tracing::info!(
            "阶段2-加载数据: {}ms, 标准地址 {} 条, 待匹配 {} 条",
            load_ms,
            canonical.len(),
            secondary.len()
        );

        // 阶段3：重建索引（新树 + 空缓存），原子切换
        let stage = Instant::now();
        let index = Arc::new(build_index(&canonical));
        self.index.store(index.clone());
        maybe_trim_rss();
        let build_ms = elapsed_ms(stage);
        tracing::info!("阶段3-重建索引: {}ms", build_ms);

        // 阶段4：并行匹配
        let stage = Instant::now();
        let workers = self.resolve_workers(secondary.len());
        let accepted = batch::match_batch(&secondary, &index, self.config.batch_size, workers)?;
        let match_ms = elapsed_ms(stage);
        tracing::info!(
            "阶段4-匹配计算: {}ms, workers={}, 接受 {} 行",
            match_ms,
            workers,
            accepted.len()
        );

        // 阶段5：批量落库 + 未匹配行入复核队列
        let stage = Instant::now();
        let accepted_ids: HashSet<u64> = accepted.iter().map(|m| m.secondary_id).collect();
        let pairs: Vec<MatchedPair> = accepted
            .iter()
            .map(|m| MatchedPair {
                secondary_id: m.secondary_id,
                canonical_id: m.candidate.canonical_id(),
                score: m.candidate.score,
            })
            .collect();
        self.store.replace_pairs(pairs);

        let mut review_queued = 0usize;
        for row in &secondary {
            if !accepted_ids.contains(&row.id) {
                self.store.enqueue_review(row.id, row.raw.clone());
                review_queued += 1;
            }
        }
        let persist_ms = elapsed_ms(stage);
        tracing::info!(
            "阶段5-批量保存: {}ms, 匹配对 {} 条, 入复核 {} 条",
            persist_ms,
            accepted.len(),
            review_queued
        );

        let cache = index.caches().stats();
        tracing::info!(
            "缓存统计: 解析缓存 {} 条, 匹配缓存 {} 条",
            cache.parse_cache_size,
            cache.match_cache_size
        );

        let report = RunReport {
            canonical_rows: canonical.len(),
            secondary_rows: secondary.len(),
            accepted: accepted.len(),
            review_queued,
            match_rate: match_rate(accepted.len(), secondary.len()),
            cache,
            timings: StageTimings {
                clear_ms,
                load_ms,
                build_ms,
                match_ms,
                persist_ms,
                total_ms: elapsed_ms(total_started),
            },
        };
        tracing::info!("=== 匹配完成: 总耗时 {}ms ===", report.timings.total_ms);
        Ok(report)
    }

    fn resolve_workers(&self, rows: usize) -> usize {
        if self.config.workers > 0 {
            return self.config.workers;
        }
        let mut scheduler = self.scheduler.lock();
        scheduler.adjust_parallelism();
        scheduler.select_workers(rows)
    }

    /// 面向控制面的总体统计
    pub fn statistics(&self) -> EngineStats {
        let secondary_total = self.store.secondary_count();
        let matched_pairs = self.store.pair_count();
        EngineStats {
            canonical_total: self.store.canonical_count(),
            secondary_total,
            matched_pairs,
            review_pending: self.store.review_pending_count(),
            match_rate: match_rate(matched_pairs, secondary_total),
        }
    }

    pub fn clear_caches(&self) {
        self.index.load().caches().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.index.load().caches().stats()
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn match_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    matched as f64 / total as f64 * 100.0
}

#[cfg(feature = "mimalloc")]
fn maybe_trim_rss() {
    // mimalloc 作为全局分配器时，glibc 的 malloc_trim 无效，需要调用 mimalloc 自己的回收。
    extern "C" {
        fn mi_collect(force: bool);
    }
    unsafe { mi_collect(true) };
}

#[cfg(all(not(feature = "mimalloc"), target_os = "linux", target_env = "gnu"))]
fn maybe_trim_rss() {
    // glibc malloc 的主动回吐：旧索引整体释放后把空闲块还给 OS。
    unsafe {
        libc::malloc_trim(0);
    }
}

#[cfg(all(
    not(feature = "mimalloc"),
    not(all(target_os = "linux", target_env = "gnu"))
))]
fn maybe_trim_rss() {}
