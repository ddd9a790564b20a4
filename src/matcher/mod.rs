pub mod cache;
pub mod candidate;

pub use cache::MatchCaches;
pub use candidate::{rank_and_deduplicate, MatchCandidate};

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::ReferenceAddress;
use crate::index::tree::TreeNode;
use crate::index::AddressIndex;
use crate::parse::fuzzy_eq;

/// 高置信阈值：严格大于触发提前返回，大于等于作为批量自动接受线
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.95;

/// 单次匹配最多返回的候选数
pub const MAX_CANDIDATES: usize = 5;

/// depth 归一化分母：8 级以深视为满分
const DEPTH_NORM: f64 = 8.0;

/// 多粒度匹配：对查询地址的组件前缀逐级放长（粒度 1..=N），
/// 每级做多路径树检索并打分。
///
/// - 粒度内首名分数 > 0.95 时提前返回前 5 名，更高粒度不再尝试；
/// - 否则该级结果整体覆盖上一级结果（覆盖而非合并），最末一个非空
///   粒度的结果胜出；
/// - 全部粒度无候选时返回空列表。
///
/// 结果写入匹配缓存；命中缓存时原样返回，不重新打分。
pub fn match_one(raw: &str, index: &AddressIndex) -> Arc<Vec<MatchCandidate>> {
    let caches = index.caches();
    if let Some(hit) = caches.cached_match(raw) {
        tracing::trace!("匹配缓存命中: {}", raw);
        return hit;
    }

    let query = caches.parse_cached(raw);
    let mut best_so_far: Vec<MatchCandidate> = Vec::new();

    for granularity in 1..=query.len() {
        let prefix = &query[..granularity];
        let mut level_candidates = collect_candidates(prefix, index);
        if level_candidates.is_empty() {
            level_candidates = relax_match_conditions(prefix, index);
        }
        if level_candidates.is_empty() {
            continue;
        }

        let ranked = rank_and_deduplicate(level_candidates);
        if ranked[0].score > HIGH_CONFIDENCE_THRESHOLD {
            let result = Arc::new(truncate(ranked));
            caches.store_match(raw, result.clone());
            return result;
        }
        best_so_far = ranked;
    }

    let result = Arc::new(truncate(best_so_far));
    caches.store_match(raw, result.clone());
    result
}

fn truncate(mut ranked: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    ranked.truncate(MAX_CANDIDATES);
    ranked
}

/// 多路径前缀下钻：每消费一个目标组件，同时走精确子节点与所有
/// 模糊相等的子节点；目标组件为空时退化为通配（走全部子节点）。
/// 返回消费完整个前缀后可达的节点集合（按首次到达序，去重）。
fn find_matching_nodes<'t>(prefix: &[String], root: &'t TreeNode) -> Vec<&'t TreeNode> {
    let mut frontier: Vec<&'t TreeNode> = vec![root];

    for target in prefix {
        let mut next: Vec<&'t TreeNode> = Vec::new();
        let mut seen: HashSet<*const TreeNode> = HashSet::new();

        for node in &frontier {
            if let Some(exact) = node.child(target) {
                push_unique(&mut next, &mut seen, exact);
            }
            for (label, child) in node.children() {
                if fuzzy_eq(target, label) {
                    push_unique(&mut next, &mut seen, child);
                }
            }
            if target.is_empty() {
                for (_, child) in node.children() {
                    push_unique(&mut next, &mut seen, child);
                }
            }
        }

        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

fn push_unique<'t>(
    next: &mut Vec<&'t TreeNode>,
    seen: &mut HashSet<*const TreeNode>,
    node: &'t TreeNode,
) {
    if seen.insert(node as *const TreeNode) {
        next.push(node);
    }
}

/// 收集一个粒度下的全部候选：只有精确终止于可达节点的地址参与打分
fn collect_candidates(prefix: &[String], index: &AddressIndex) -> Vec<MatchCandidate> {
    let reached = find_matching_nodes(prefix, index.tree().root());
    let mut candidates = Vec::new();

    for node in reached {
        if !node.is_leaf() || node.addresses().is_empty() {
            continue;
        }
        for address in node.addresses() {
            let score = score_candidate(prefix, address, node, index);
            candidates.push(MatchCandidate {
                address: address.clone(),
                score,
            });
        }
    }
    candidates
}

/// 打分：逐层比较查询前缀与标准地址的组件（相等 1.0 / 模糊 0.8），
/// 除以 max(标准层数, 粒度) 得基础分，再与 depth 分按 0.9/0.1 加权。
fn score_candidate(
    prefix: &[String],
    address: &Arc<ReferenceAddress>,
    node: &TreeNode,
    index: &AddressIndex,
) -> f64 {
    let ref_components = index.caches().parse_cached(&address.raw);
    let compared = ref_components.len().min(prefix.len());

    let mut exact = 0.0_f64;
    for i in 0..compared {
        if ref_components[i] == prefix[i] {
            exact += 1.0;
        } else if fuzzy_eq(&ref_components[i], &prefix[i]) {
            exact += 0.8;
        }
    }

    let total_levels = ref_components.len().max(prefix.len()) as f64;
    let base_score = exact / total_levels;
    let depth_score = (node.depth() as f64 / DEPTH_NORM).min(1.0);

    (base_score * 0.9 + depth_score * 0.1).min(1.0)
}

/// 放宽条件的兜底检索。刻意保留为不产出任何候选的扩展点，
/// 永不失败；后续如需更宽松的召回策略在此实现。
fn relax_match_conditions(_prefix: &[String], _index: &AddressIndex) -> Vec<MatchCandidate> {
    Vec::new()
}
