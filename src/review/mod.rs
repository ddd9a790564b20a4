use std::sync::Arc;

use crate::core::{ReviewRecord, ReviewStatus};
use crate::store::AddressStore;

/// 人工复核工作流。
///
/// 状态机：Pending →(accept)→ Accepted / Pending →(reject)→ Rejected，
/// 两个终态不可再迁移；对非 Pending 记录的操作静默跳过，既不算错误
/// 也不计入返回的生效行数。接受的记录生成新的标准地址，
/// 下一轮整体重建索引后即可被命中。
pub struct ReviewQueue {
    store: Arc<AddressStore>,
}

impl ReviewQueue {
    pub fn new(store: Arc<AddressStore>) -> Self {
        Self { store }
    }

    pub fn list_pending(&self) -> Vec<ReviewRecord> {
        self.store
            .review_snapshot()
            .into_iter()
            .filter(|record| record.status == ReviewStatus::Pending)
            .collect()
    }

    /// 批量接受，返回实际迁移的行数
    pub fn bulk_accept(&self, ids: &[u64]) -> usize {
        let mut applied = 0usize;
        for &id in ids {
            // 先在复核表锁内完成状态迁移，再到标准地址表追加，避免持两把锁
            let raw = {
                let mut review = self.store.review.write();
                match review.get_mut(&id) {
                    Some(record) if record.status == ReviewStatus::Pending => {
                        record.status = ReviewStatus::Accepted;
                        Some(record.raw.clone())
                    }
                    _ => None,
                }
            };
            if let Some(raw) = raw {
                self.store.add_canonical(raw);
                applied += 1;
            }
        }
        if applied > 0 {
            tracing::info!("复核通过 {} 条，已并入标准地址表", applied);
        }
        applied
    }

    /// 批量驳回，返回实际迁移的行数。记录保留用于审计。
    pub fn bulk_reject(&self, ids: &[u64]) -> usize {
        let mut applied = 0usize;
        {
            let mut review = self.store.review.write();
            for &id in ids {
                if let Some(record) = review.get_mut(&id) {
                    if record.status == ReviewStatus::Pending {
                        record.status = ReviewStatus::Rejected;
                        applied += 1;
                    }
                }
            }
        }
        if applied > 0 {
            tracing::info!("复核驳回 {} 条", applied);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with_pending(raw: &str) -> (ReviewQueue, u64) {
        let store = Arc::new(AddressStore::new());
        let id = store.enqueue_review(1, raw.to_string());
        (ReviewQueue::new(store), id)
    }

    #[test]
    fn accept_promotes_to_canonical_and_is_terminal() {
        let (queue, id) = queue_with_pending("浙江省杭州市西湖区文三路100号");

        assert_eq!(queue.bulk_accept(&[id]), 1);
        let record = queue.store.review_get(id).unwrap();
        assert_eq!(record.status, ReviewStatus::Accepted);

        let canonical = queue.store.canonical_snapshot();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].raw, "浙江省杭州市西湖区文三路100号");

        // 终态之后 reject 是静默空操作
        assert_eq!(queue.bulk_reject(&[id]), 0);
        assert_eq!(
            queue.store.review_get(id).unwrap().status,
            ReviewStatus::Accepted
        );
    }

    #[test]
    fn reject_is_terminal_and_keeps_record_for_audit() {
        let (queue, id) = queue_with_pending("某不完整地址");

        assert_eq!(queue.bulk_reject(&[id]), 1);
        assert_eq!(
            queue.store.review_get(id).unwrap().status,
            ReviewStatus::Rejected
        );
        // 不产生标准地址
        assert_eq!(queue.store.canonical_count(), 0);

        // 再接受也是空操作
        assert_eq!(queue.bulk_accept(&[id]), 0);
        assert_eq!(
            queue.store.review_get(id).unwrap().status,
            ReviewStatus::Rejected
        );
    }

    #[test]
    fn unknown_ids_are_silently_skipped() {
        let (queue, id) = queue_with_pending("甲地址");
        assert_eq!(queue.bulk_accept(&[999, id, 1000]), 1);
        assert_eq!(queue.store.canonical_count(), 1);
    }

    #[test]
    fn list_pending_excludes_terminal_records() {
        let store = Arc::new(AddressStore::new());
        let a = store.enqueue_review(1, "甲".to_string());
        let b = store.enqueue_review(2, "乙".to_string());
        let c = store.enqueue_review(3, "丙".to_string());
        let queue = ReviewQueue::new(store);

        queue.bulk_accept(&[a]);
        queue.bulk_reject(&[b]);

        let pending: Vec<u64> = queue.list_pending().iter().map(|r| r.id).collect();
        assert_eq!(pending, vec![c]);
    }

    #[test]
    fn bulk_operations_count_only_transitions() {
        let store = Arc::new(AddressStore::new());
        let a = store.enqueue_review(1, "甲".to_string());
        let b = store.enqueue_review(2, "乙".to_string());
        let queue = ReviewQueue::new(store);

        assert_eq!(queue.bulk_accept(&[a, b]), 2);
        // 重复提交全部是空操作
        assert_eq!(queue.bulk_accept(&[a, b]), 0);
        assert_eq!(queue.store.canonical_count(), 2);
    }
}
