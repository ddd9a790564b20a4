use std::sync::Arc;

use dashmap::DashMap;

use crate::matcher::candidate::MatchCandidate;
use crate::parse;
use crate::stats::CacheStats;

/// 解析缓存 + 匹配结果缓存，均以原始地址文本为键。
///
/// 两个缓存与一个索引同生命周期：重建索引即整体换新。并发填充允许
/// 同键竞态（重复计算无害，后写覆盖），不要求 exactly-once。
pub struct MatchCaches {
    parse: DashMap<String, Arc<Vec<String>>>,
    matches: DashMap<String, Arc<Vec<MatchCandidate>>>,
}

impl MatchCaches {
    pub fn new() -> Self {
        Self {
            parse: DashMap::with_capacity(256),
            matches: DashMap::with_capacity(256),
        }
    }

    /// 带缓存的地址解析
    pub fn parse_cached(&self, raw: &str) -> Arc<Vec<String>> {
        if let Some(hit) = self.parse.get(raw) {
            return hit.value().clone();
        }
        let parsed = Arc::new(parse::parse_components(raw));
        self.parse.insert(raw.to_string(), parsed.clone());
        parsed
    }

    pub fn cached_match(&self, raw: &str) -> Option<Arc<Vec<MatchCandidate>>> {
        self.matches.get(raw).map(|hit| hit.value().clone())
    }

    pub fn store_match(&self, raw: &str, result: Arc<Vec<MatchCandidate>>) {
        self.matches.insert(raw.to_string(), result);
    }

    /// 清空两个缓存。缓存结果依赖索引状态，重建前必须调用（或换新索引）。
    pub fn clear(&self) {
        self.parse.clear();
        self.matches.clear();
        tracing::debug!("已清理匹配器缓存");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            parse_cache_size: self.parse.len(),
            match_cache_size: self.matches.len(),
        }
    }
}

impl Default for MatchCaches {
    fn default() -> Self {
        Self::new()
    }
}
