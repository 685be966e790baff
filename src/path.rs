//! 路径寻址和只读查找
//!
//! 路径是从根开始的子节点下标序列, 空路径就是根本身。
//! 节点上不保存路径, 每次调用时现算。

use crate::ast::{NodeRef, RuleGroup};

/// 按id找到的节点, 以及到达它的路径
#[derive(Debug, Clone, PartialEq)]
pub struct Located<'a> {
    pub node: NodeRef<'a>,
    pub path: Vec<usize>,
}

/// 返回 `path` 处的节点, 路径越界时返回 `None`
pub fn node_at_path<'a>(query: &'a RuleGroup, path: &[usize]) -> Option<NodeRef<'a>> {
    let mut current = NodeRef::Group(query);
    for &index in path {
        current = current.as_group()?.rules.get(index)?.view();
    }
    Some(current)
}

/// 深度优先前序查找, id重复时返回第一个
pub fn find_node_by_id<'a>(query: &'a RuleGroup, id: &str) -> Option<Located<'a>> {
    let mut path = Vec::new();
    find_in(NodeRef::Group(query), id, &mut path).map(|node| Located { node, path })
}

fn find_in<'a>(node: NodeRef<'a>, id: &str, path: &mut Vec<usize>) -> Option<NodeRef<'a>> {
    if node.id() == id {
        return Some(node);
    }
    let group = node.as_group()?;
    for (index, child) in group.rules.iter().enumerate() {
        path.push(index);
        if let Some(found) = find_in(child.view(), id, path) {
            return Some(found);
        }
        path.pop();
    }
    None
}

/// 从根到 `path` (包含) 途经的任一节点已锁定即为 true; 路径越界处返回 false
pub fn is_ancestor_locked(query: &RuleGroup, path: &[usize]) -> bool {
    let mut current = NodeRef::Group(query);
    if current.is_locked() {
        return true;
    }
    for &index in path {
        let Some(next) = current.as_group().and_then(|group| group.rules.get(index)) else {
            return false;
        };
        current = next.view();
        if current.is_locked() {
            return true;
        }
    }
    false
}

/// 把路径拆成父路径和最后一个下标
pub fn split_parent(path: &[usize]) -> Option<(&[usize], usize)> {
    path.split_last().map(|(last, parent)| (parent, *last))
}

/// 空路径写作 `root`, 其余用点分隔下标
pub fn format_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    path.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
