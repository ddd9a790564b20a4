use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::core::{
    MatchedPair, ReferenceAddress, ReviewRecord, ReviewStatus, SecondaryAddress,
};

/// 进程内存储：标准地址 / 待匹配地址 / 已确认匹配对 / 复核队列。
///
/// 持久化技术是外部协作者，这里只承担四张逻辑表的进程内形态；
/// id 由原子序列发放，复核队列保持入队序。
pub struct AddressStore {
    canonical: RwLock<Vec<Arc<ReferenceAddress>>>,
    secondary: RwLock<Vec<SecondaryAddress>>,
    pairs: RwLock<Vec<MatchedPair>>,
    pub(crate) review: RwLock<IndexMap<u64, ReviewRecord>>,
    canonical_seq: AtomicU64,
    secondary_seq: AtomicU64,
    review_seq: AtomicU64,
}

impl AddressStore {
    pub fn new() -> Self {
        Self {
            canonical: RwLock::new(Vec::new()),
            secondary: RwLock::new(Vec::new()),
            pairs: RwLock::new(Vec::new()),
            review: RwLock::new(IndexMap::new()),
            canonical_seq: AtomicU64::new(0),
            secondary_seq: AtomicU64::new(0),
            review_seq: AtomicU64::new(0),
        }
    }

    pub fn add_canonical(&self, raw: impl Into<String>) -> Arc<ReferenceAddress> {
        let id = self.canonical_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let address = Arc::new(ReferenceAddress {
            id,
            raw: raw.into(),
        });
        self.canonical.write().push(address.clone());
        address
    }

    pub fn extend_canonical<I>(&self, raws: I)
    where
        I: IntoIterator<Item = String>,
    {
        for raw in raws {
            self.add_canonical(raw);
        }
    }

    pub fn canonical_snapshot(&self) -> Vec<Arc<ReferenceAddress>> {
        self.canonical.read().clone()
    }

    pub fn canonical_count(&self) -> usize {
        self.canonical.read().len()
    }

    pub fn add_secondary(&self, raw: impl Into<String>) -> u64 {
        let id = self.secondary_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.secondary.write().push(SecondaryAddress {
            id,
            raw: raw.into(),
        });
        id
    }

    pub fn extend_secondary<I>(&self, raws: I)
    where
        I: IntoIterator<Item = String>,
    {
        for raw in raws {
            self.add_secondary(raw);
        }
    }

    pub fn secondary_snapshot(&self) -> Vec<SecondaryAddress> {
        self.secondary.read().clone()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.read().len()
    }

    /// 每轮匹配开始前清空上一轮产出（匹配对 + 复核队列）
    pub fn clear_run_results(&self) {
        self.pairs.write().clear();
        self.review.write().clear();
    }

    /// 一次性批量写入本轮全部匹配对
    pub fn replace_pairs(&self, pairs: Vec<MatchedPair>) {
        *self.pairs.write() = pairs;
    }

    pub fn pairs_snapshot(&self) -> Vec<MatchedPair> {
        self.pairs.read().clone()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.read().len()
    }

    pub fn enqueue_review(&self, secondary_id: u64, raw: String) -> u64 {
        let id = self.review_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.review.write().insert(
            id,
            ReviewRecord {
                id,
                secondary_id,
                raw,
                status: ReviewStatus::Pending,
            },
        );
        id
    }

    pub fn review_get(&self, id: u64) -> Option<ReviewRecord> {
        self.review.read().get(&id).cloned()
    }

    /// 复核队列快照（入队序）
    pub fn review_snapshot(&self) -> Vec<ReviewRecord> {
        self.review.read().values().cloned().collect()
    }

    pub fn review_pending_count(&self) -> usize {
        self.review_count_by_status(ReviewStatus::Pending)
    }

    pub fn review_count_by_status(&self, status: ReviewStatus) -> usize {
        self.review
            .read()
            .values()
            .filter(|record| record.status == status)
            .count()
    }
}

impl Default for AddressStore {
    fn default() -> Self {
        Self::new()
    }
}
