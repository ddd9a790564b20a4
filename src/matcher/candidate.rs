use std::collections::HashSet;
use std::sync::Arc;

use crate::core::ReferenceAddress;

/// 匹配候选。身份只看标准地址 id：同一地址出现多次即视为重复，
/// 与分数无关。排序交给显式比较器（分数降序、先到者稳定在前）。
#[derive(Clone, Debug)]
pub struct MatchCandidate {
    pub address: Arc<ReferenceAddress>,
    pub score: f64,
}

impl MatchCandidate {
    pub fn canonical_id(&self) -> u64 {
        self.address.id
    }
}

/// 先按 id 去重（保留首次出现），再按分数降序稳定排序。
pub fn rank_and_deduplicate(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut seen: HashSet<u64> = HashSet::with_capacity(candidates.len());
    let mut unique: Vec<MatchCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.address.id))
        .collect();
    // sort_by 为稳定排序，分数相同保持首次出现的先后
    unique.sort_by(|a, b| b.score.total_cmp(&a.score));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, score: f64) -> MatchCandidate {
        MatchCandidate {
            address: Arc::new(ReferenceAddress {
                id,
                raw: format!("地址{id}"),
            }),
            score,
        }
    }

    #[test]
    fn sorts_descending_by_score() {
        let ranked = rank_and_deduplicate(vec![
            candidate(1, 0.5),
            candidate(2, 0.9),
            candidate(3, 0.7),
        ]);
        let ids: Vec<u64> = ranked.iter().map(MatchCandidate::canonical_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn duplicates_by_id_keep_first_occurrence() {
        let ranked = rank_and_deduplicate(vec![
            candidate(1, 0.6),
            candidate(1, 0.9),
            candidate(2, 0.6),
        ]);
        assert_eq!(ranked.len(), 2);
        // id=1 的第二次出现被丢弃，保留首个 0.6
        assert_eq!(ranked[0].canonical_id(), 1);
        assert!((ranked[0].score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn equal_scores_preserve_encounter_order() {
        let ranked = rank_and_deduplicate(vec![
            candidate(7, 0.8),
            candidate(8, 0.8),
            candidate(9, 0.8),
        ]);
        let ids: Vec<u64> = ranked.iter().map(MatchCandidate::canonical_id).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }
}
