use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use rayon::prelude::*;

use crate::core::SecondaryAddress;
use crate::index::AddressIndex;
use crate::matcher::{self, MatchCandidate, HIGH_CONFIDENCE_THRESHOLD};

/// 单行匹配超过该时长记一次慢匹配
const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(100);

/// 批量匹配中被自动接受的一行
#[derive(Clone, Debug)]
pub struct AcceptedMatch {
    pub secondary_id: u64,
    pub candidate: MatchCandidate,
}

/// 批量匹配：行按 batch_size 切批，批次在 worker_count 大小的线程池上
/// fan-out，批内行级再 fan-out（无序）。collect 即全量 join 屏障，
/// 聚合完成后才返回，供上层一次性批量写入。
///
/// 首名分数 >= 0.95 的行进入接受集；其余行由上层送入复核队列。
pub fn match_batch(
    rows: &[SecondaryAddress],
    index: &AddressIndex,
    batch_size: usize,
    worker_count: usize,
) -> anyhow::Result<Vec<AcceptedMatch>> {
    match_batch_with(rows, batch_size, worker_count, |raw| {
        matcher::match_one(raw, index)
    })
}

/// 行级匹配函数可注入：故障隔离测试会换成受控 panic 的实现。
///
/// 故障粒度分两层：单行 panic 只丢该行（按未匹配处理），
/// 整批 panic 只丢该批，其余批次照常聚合。
pub fn match_batch_with<F>(
    rows: &[SecondaryAddress],
    batch_size: usize,
    worker_count: usize,
    match_fn: F,
) -> anyhow::Result<Vec<AcceptedMatch>>
where
    F: Fn(&str) -> Arc<Vec<MatchCandidate>> + Sync,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
        .context("构建匹配线程池失败")?;

    let accepted: Vec<AcceptedMatch> = pool.install(|| {
        rows.par_chunks(batch_size)
            .enumerate()
            .map(|(batch_no, batch)| {
                match catch_unwind(AssertUnwindSafe(|| match_rows(batch, &match_fn))) {
                    Ok(matched) => matched,
                    Err(_) => {
                        tracing::error!("批次 {} 整体失败，该批次计零", batch_no);
                        Vec::new()
                    }
                }
            })
            .flatten()
            .collect()
    });

    tracing::info!("批量匹配完成: {} 行中接受 {} 行", rows.len(), accepted.len());
    Ok(accepted)
}

fn match_rows<F>(batch: &[SecondaryAddress], match_fn: &F) -> Vec<AcceptedMatch>
where
    F: Fn(&str) -> Arc<Vec<MatchCandidate>> + Sync,
{
    batch
        .par_iter()
        .filter_map(|row| {
            let started = Instant::now();
            let candidates = match catch_unwind(AssertUnwindSafe(|| match_fn(&row.raw))) {
                Ok(candidates) => candidates,
                Err(_) => {
                    tracing::warn!("行匹配失败，按未匹配处理: secondary_id={}", row.id);
                    return None;
                }
            };
            let elapsed = started.elapsed();
            if elapsed > SLOW_MATCH_THRESHOLD {
                tracing::warn!("慢匹配: {:?}, 地址: {}", elapsed, row.raw);
            }

            let best = candidates.first()?;
            if best.score >= HIGH_CONFIDENCE_THRESHOLD {
                Some(AcceptedMatch {
                    secondary_id: row.id,
                    candidate: best.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ReferenceAddress;
    use crate::index::build_index;

    fn rows(raws: &[&str]) -> Vec<SecondaryAddress> {
        raws.iter()
            .enumerate()
            .map(|(i, raw)| SecondaryAddress {
                id: i as u64 + 1,
                raw: raw.to_string(),
            })
            .collect()
    }

    fn fake_candidates(score: f64) -> Arc<Vec<MatchCandidate>> {
        Arc::new(vec![MatchCandidate {
            address: Arc::new(ReferenceAddress {
                id: 42,
                raw: "某标准地址".to_string(),
            }),
            score,
        }])
    }

    #[test]
    fn faulty_row_is_isolated_from_its_batch() {
        // 三行同批，第二行打分期间 panic：一三行照常接受，第二行剔除
        let rows = rows(&["甲地址", "爆炸地址", "丙地址"]);
        let accepted = match_batch_with(&rows, 3, 2, |raw| {
            if raw.contains("爆炸") {
                panic!("scoring fault");
            }
            fake_candidates(0.96)
        })
        .unwrap();

        let mut ids: Vec<u64> = accepted.iter().map(|m| m.secondary_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn threshold_is_inclusive_at_exactly_095() {
        let rows = rows(&["刚好达线", "差一点"]);
        let accepted = match_batch_with(&rows, 10, 1, |raw| {
            if raw == "刚好达线" {
                fake_candidates(0.95)
            } else {
                fake_candidates(0.949)
            }
        })
        .unwrap();

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].secondary_id, 1);
    }

    #[test]
    fn rows_without_candidates_fall_out() {
        let rows = rows(&["a", "b"]);
        let accepted = match_batch_with(&rows, 1, 2, |_| Arc::new(Vec::new())).unwrap();
        assert!(accepted.is_empty());
    }

    #[test]
    fn multiple_batches_aggregate_across_the_pool() {
        let raws: Vec<String> = (0..50).map(|i| format!("地址{i}")).collect();
        let raw_refs: Vec<&str> = raws.iter().map(String::as_str).collect();
        let rows = rows(&raw_refs);

        let accepted = match_batch_with(&rows, 7, 4, |_| fake_candidates(1.0)).unwrap();
        assert_eq!(accepted.len(), 50);

        let mut ids: Vec<u64> = accepted.iter().map(|m| m.secondary_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn end_to_end_against_real_index() {
        let canonical = vec![Arc::new(ReferenceAddress {
            id: 1,
            raw: "浙江省杭州市西湖区文三路100号".to_string(),
        })];
        let index = build_index(&canonical);

        let rows = rows(&[
            "浙江省杭州市西湖区文三路100号",
            "广东省深圳市南山区科技园路1号",
        ]);
        let accepted = match_batch(&rows, &index, 2, 2).unwrap();

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].secondary_id, 1);
        assert_eq!(accepted[0].candidate.canonical_id(), 1);
        assert!(accepted[0].candidate.score >= HIGH_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let rows = rows(&["a"]);
        let accepted = match_batch_with(&rows, 0, 1, |_| fake_candidates(1.0)).unwrap();
        assert_eq!(accepted.len(), 1);
    }
}
