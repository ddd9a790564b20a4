use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::ReferenceAddress;

/// 树根标签
pub const ROOT_LABEL: &str = "中国";

/// 未命中层级的占位标签，携带层级序号（1 起），
/// 保证不同层级的未知组件不会合并进同一个节点。
pub fn placeholder_label(level: usize) -> String {
    format!("未知_{}", level + 1)
}

/// 前缀树节点。children 保持插入序，构建完成后整棵树只读，
/// 因此可被任意多个匹配 worker 并发读取。
pub struct TreeNode {
    label: String,
    depth: usize,
    weight: f64,
    leaf: bool,
    children: IndexMap<String, TreeNode>,
    addresses: Vec<Arc<ReferenceAddress>>,
}

impl TreeNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            depth: 0,
            weight: 1.0,
            leaf: false,
            children: IndexMap::new(),
            addresses: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// 有地址精确终止于此节点时为真（节点可同时是内部节点）
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn addresses(&self) -> &[Arc<ReferenceAddress>] {
        &self.addresses
    }

    pub fn child(&self, label: &str) -> Option<&TreeNode> {
        self.children.get(label)
    }

    /// 子节点按插入序迭代，保证候选收集顺序确定
    pub fn children(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children.iter().map(|(label, node)| (label.as_str(), node))
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// 标准地址前缀树：每轮从标准地址表整体重建，单写者构建、冻结后只读。
pub struct AddressTree {
    root: TreeNode,
    address_count: usize,
}

impl AddressTree {
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(ROOT_LABEL),
            address_count: 0,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// 已入树的地址条数（空解析的地址不入树）
    pub fn address_count(&self) -> usize {
        self.address_count
    }

    pub fn node_count(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            1 + node.children.values().map(walk).sum::<usize>()
        }
        walk(&self.root)
    }

    /// 沿组件序列逐层下钻插入，空组件映射为层级占位标签；
    /// 末组件所在节点记录地址并标记 leaf。只追加，不删除。
    pub fn insert(&mut self, components: &[String], address: Arc<ReferenceAddress>) {
        if components.is_empty() {
            return;
        }

        let mut node = &mut self.root;
        for (level, component) in components.iter().enumerate() {
            let label = if component.is_empty() {
                placeholder_label(level)
            } else {
                component.clone()
            };
            node = node
                .children
                .entry(label.clone())
                .or_insert_with(|| TreeNode::new(label));
        }
        node.addresses.push(address);
        node.leaf = true;
        self.address_count += 1;
    }

    /// 全部插入完成后一次性重算 depth 与 weight = ln(depth+1)
    pub fn finalize(&mut self) {
        fn assign(node: &mut TreeNode, depth: usize) {
            node.depth = depth;
            node.weight = ((depth + 1) as f64).ln();
            for child in node.children.values_mut() {
                assign(child, depth + 1);
            }
        }
        assign(&mut self.root, 0);
    }
}

impl Default for AddressTree {
    fn default() -> Self {
        Self::new()
    }
}
