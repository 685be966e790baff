//! 在树内移动节点
//!
//! 移动就是先删除, 再插入到中间结果里。删除会让后面的兄弟节点都左移一位,
//! 所以按原树算出的目标路径在插入前要先修正:
//!
//! ```text
//! [r0, r1, r2, r3]   move [0] -> [3]
//! 删除 [0]        -> [r1, r2, r3]
//! 修正 [3]        -> [2]
//! 插入到 [2]      -> [r1, r2, r0, r3]
//! ```

use crate::ast::{NodeRef, Query, RuleGroup};
use crate::edit::{insert_into, remove_from, Edit, Rejection};
use crate::path::{is_ancestor_locked, node_at_path, split_parent};

/// 把 `source` 处的节点移动到 `destination` 所指的位置
///
/// `destination` 按移动*之前*的树解释: 最后一个下标是前缀所指分组内的位置, `[]` 追加到根分组。
/// 移动要么完整生效, 要么不生效; 无法重新插入时节点也不会被删除。
pub fn move_node(query: &Query, source: &[usize], destination: &[usize]) -> Edit {
    let result = relocate(query, source, destination);
    Edit::finish("move", query, source, result)
}

fn relocate(query: &RuleGroup, source: &[usize], destination: &[usize]) -> Result<RuleGroup, Rejection> {
    let (source_parent, source_index) = split_parent(source).ok_or(Rejection::RootNotAllowed)?;
    let node = node_at_path(query, source_parent)
        .and_then(NodeRef::as_group)
        .and_then(|group| group.rules.get(source_index))
        .cloned()
        .ok_or(Rejection::InvalidPath)?;
    if node.is_locked() {
        return Err(Rejection::Locked);
    }

    let target_group = split_parent(destination).map_or(&[][..], |(parent, _)| parent);
    if !destination.is_empty() && is_ancestor_locked(query, target_group) {
        return Err(Rejection::Locked);
    }
    if target_group.starts_with(source) {
        return Err(Rejection::IntoOwnSubtree);
    }

    let without = remove_from(query, source)?;
    insert_into(&without, &adjusted_destination(source, destination), node)
}

/// 把 `destination` 换算成删除 `source` 之后的树中的路径
///
/// 只有 `source` 父分组那一层的下标可能变化, 并且只在目标经过同一父分组且位于被删位置之后时才减一。
pub fn adjusted_destination(source: &[usize], destination: &[usize]) -> Vec<usize> {
    let mut adjusted = destination.to_vec();
    let Some((source_parent, source_index)) = split_parent(source) else {
        return adjusted;
    };
    let depth = source_parent.len();
    if destination.len() <= depth || !destination.starts_with(source_parent) {
        return adjusted;
    }
    if source_index < destination[depth] {
        adjusted[depth] -= 1;
    }
    adjusted
}

/// 从 `drag` 拖到 `drop` 是否应当拒绝: 落在被拖节点内部, 落在原位或紧随其后的位置, 或达到 `max_depth`
///
/// 仅供参考, [`move_node`] 不会调用它。
pub fn is_invalid_drop(drag: &[usize], drop: &[usize], max_depth: Option<usize>) -> bool {
    if max_depth.is_some_and(|max| drop.len() >= max) {
        return true;
    }

    if drop.len() > drag.len() && drop.starts_with(drag) {
        return true;
    }

    match (split_parent(drag), split_parent(drop)) {
        (Some((drag_parent, drag_index)), Some((drop_parent, drop_index))) if drag_parent == drop_parent => {
            drop_index == drag_index || drag_index.checked_add(1) == Some(drop_index)
        }
        _ => false,
    }
}
