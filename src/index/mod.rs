pub mod tree;

pub use tree::{AddressTree, TreeNode};

use std::sync::Arc;

use crate::core::ReferenceAddress;
use crate::matcher::MatchCaches;

/// 一轮匹配的索引值：前缀树 + 与其同生命周期的解析/匹配缓存。
///
/// 重建总是产出全新的 `AddressIndex`（缓存天然为空），由上层原子切换，
/// 旧索引连同旧缓存整体废弃。构建期间不存在并发写者，冻结后只读。
pub struct AddressIndex {
    tree: AddressTree,
    caches: MatchCaches,
}

impl AddressIndex {
    pub fn empty() -> Self {
        build_index(&[])
    }

    pub fn tree(&self) -> &AddressTree {
        &self.tree
    }

    pub fn caches(&self) -> &MatchCaches {
        &self.caches
    }
}

/// 从标准地址表整体构建索引。解析结果顺手写入解析缓存，
/// 后续打分阶段复用，避免标准地址被重复解析。
pub fn build_index(addresses: &[Arc<ReferenceAddress>]) -> AddressIndex {
    let caches = MatchCaches::new();
    let mut tree = AddressTree::new();

    for address in addresses {
        let components = caches.parse_cached(&address.raw);
        tree.insert(&components, address.clone());
    }
    tree.finalize();

    tracing::info!(
        "地址树构建完成: {} 条地址, {} 个节点",
        tree.address_count(),
        tree.node_count()
    );
    AddressIndex { tree, caches }
}
