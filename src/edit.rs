//! 按路径寻址的编辑原语
//!
//! 每个原语接收当前的根节点并返回新的根节点, 只重建从根到被编辑节点这条路径上的分组,
//! 路径之外的兄弟节点原样沿用同一个 `Arc`。
//!
//! 被拒绝的编辑 (节点已锁定, 路径越界, 空补丁) 不算错误: 返回的 [`Edit`]
//! 持有未改动的输入根节点, 并说明原因。
//!
//! ## 重建流程图
//!
//! ```text
//! rewrite_group(root, [1, 0], f)
//!   root ── 已锁定? ─→ Locked
//!    └─ rules[1] ── 不存在或是规则? ─→ InvalidPath
//!        └─ rules[0] ── f(group) ─→ 重建后的分组
//!    ←─ 浅拷贝 rules[1] 和 root, 逐层带回
//! ```

use crate::ast::{GroupPatch, Node, Query, RuleGroup, RulePatch};
use crate::ids::IdGenerator;
use crate::path::{format_path, split_parent};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// 编辑被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// 目标、父节点或祖先已锁定
    Locked,
    /// 下标越界, 或路径穿过了规则
    InvalidPath,
    /// 该操作不适用于根节点
    RootNotAllowed,
    NotARule,
    NotAGroup,
    EmptyPatch,
    /// 移动的目标位置在被移动的子树内部
    IntoOwnSubtree,
    /// 新分组会达到配置的最大嵌套层数
    MaxDepth,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Locked => "locked",
            Rejection::InvalidPath => "no such path",
            Rejection::RootNotAllowed => "not allowed on the root",
            Rejection::NotARule => "target is not a rule",
            Rejection::NotAGroup => "target is not a group",
            Rejection::EmptyPatch => "nothing to update",
            Rejection::IntoOwnSubtree => "destination is inside the moved node",
            Rejection::MaxDepth => "maximum nesting depth reached",
        };
        f.write_str(reason)
    }
}

/// 编辑结果: 要保留的根节点, 以及未生效时的原因
#[derive(Debug, Clone)]
pub struct Edit {
    /// 新的根节点; 被拒绝时就是输入的根节点本身
    pub query: Query,
    pub rejected: Option<Rejection>,
}

impl Edit {
    pub fn applied(&self) -> bool {
        self.rejected.is_none()
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    pub(crate) fn finish(
        operation: &'static str,
        input: &Query,
        path: &[usize],
        result: Result<RuleGroup, Rejection>,
    ) -> Edit {
        match result {
            Ok(group) => {
                trace!(operation, path = %format_path(path), "edit applied");
                Edit {
                    query: Arc::new(group),
                    rejected: None,
                }
            }
            Err(reason) => {
                debug!(operation, path = %format_path(path), %reason, "edit rejected");
                Edit {
                    query: Arc::clone(input),
                    rejected: Some(reason),
                }
            }
        }
    }
}

/// 从 `group` 沿 `path` 向下, 把找到的分组交给 `edit`, 再通过每个祖先的浅拷贝把结果带回根部
fn rewrite_group<F>(group: &RuleGroup, path: &[usize], edit: F) -> Result<RuleGroup, Rejection>
where
    F: FnOnce(&RuleGroup) -> Result<RuleGroup, Rejection>,
{
    let Some((&index, rest)) = path.split_first() else {
        return edit(group);
    };
    if group.is_locked {
        return Err(Rejection::Locked);
    }
    let child = group.rules.get(index).ok_or(Rejection::InvalidPath)?;
    let inner = child.as_group().ok_or(Rejection::InvalidPath)?;
    let rebuilt = rewrite_group(inner, rest, edit)?;
    Ok(group.with_child(index, Arc::new(Node::Group(rebuilt))))
}

/// 替换 `path` 处未锁定分组的子节点列表
fn rewrite_children<F>(query: &RuleGroup, path: &[usize], edit: F) -> Result<RuleGroup, Rejection>
where
    F: FnOnce(&[Arc<Node>]) -> Result<Vec<Arc<Node>>, Rejection>,
{
    rewrite_group(query, path, |group| {
        if group.is_locked {
            return Err(Rejection::Locked);
        }
        Ok(group.with_rules(edit(group.rules.as_slice())?))
    })
}

/// 替换 `path` 处的非根节点。这里只检查父节点及祖先的锁, 节点自己的锁由 `edit` 决定
fn rewrite_node<F>(query: &RuleGroup, path: &[usize], edit: F) -> Result<RuleGroup, Rejection>
where
    F: FnOnce(&Node) -> Result<Node, Rejection>,
{
    let (parent, index) = split_parent(path).ok_or(Rejection::RootNotAllowed)?;
    rewrite_group(query, parent, |group| {
        if group.is_locked {
            return Err(Rejection::Locked);
        }
        let child = group.rules.get(index).ok_or(Rejection::InvalidPath)?;
        let replaced = edit(&**child)?;
        Ok(group.with_child(index, Arc::new(replaced)))
    })
}

pub(crate) fn append_to(query: &RuleGroup, path: &[usize], node: Arc<Node>) -> Result<RuleGroup, Rejection> {
    rewrite_children(query, path, |rules| {
        let mut rules = rules.to_vec();
        rules.push(node);
        Ok(rules)
    })
}

/// `path` 的最后一个下标是前缀所指分组内的插入位置。
/// 越界的下标等同于追加, 空路径追加到根分组。
pub(crate) fn insert_into(query: &RuleGroup, path: &[usize], node: Arc<Node>) -> Result<RuleGroup, Rejection> {
    let Some((parent, index)) = split_parent(path) else {
        return append_to(query, &[], node);
    };
    rewrite_children(query, parent, |rules| {
        let mut rules = rules.to_vec();
        rules.insert(index.min(rules.len()), node);
        Ok(rules)
    })
}

pub(crate) fn remove_from(query: &RuleGroup, path: &[usize]) -> Result<RuleGroup, Rejection> {
    let (parent, index) = split_parent(path).ok_or(Rejection::RootNotAllowed)?;
    rewrite_children(query, parent, |rules| {
        let target = rules.get(index).ok_or(Rejection::InvalidPath)?;
        if target.is_locked() {
            return Err(Rejection::Locked);
        }
        let mut rules = rules.to_vec();
        rules.remove(index);
        Ok(rules)
    })
}

/// 把 `node` 追加到 `path` 处的分组
pub fn add(query: &Query, path: &[usize], node: impl Into<Node>) -> Edit {
    let result = append_to(query, path, Arc::new(node.into()));
    Edit::finish("add", query, path, result)
}

/// 在任意位置插入 `node`, 路径规则见 [`insert_into`]
pub fn insert_at(query: &Query, path: &[usize], node: impl Into<Node>) -> Edit {
    let result = insert_into(query, path, Arc::new(node.into()));
    Edit::finish("insert", query, path, result)
}

/// 从父分组中删除 `path` 处的节点。删掉最后一个子节点后, 分组保留为空分组
pub fn remove(query: &Query, path: &[usize]) -> Edit {
    Edit::finish("remove", query, path, remove_from(query, path))
}

/// 在 `path` 处节点的后面插入它的深拷贝, 拷贝中的每个节点都从 `ids` 取新id
pub fn duplicate(query: &Query, path: &[usize], ids: &dyn IdGenerator) -> Edit {
    let result = split_parent(path)
        .ok_or(Rejection::RootNotAllowed)
        .and_then(|(parent, index)| {
            rewrite_children(query, parent, |rules| {
                let original = rules.get(index).ok_or(Rejection::InvalidPath)?;
                if original.is_locked() {
                    return Err(Rejection::Locked);
                }
                let copy = Arc::new(original.deep_clone(ids));
                let mut rules = rules.to_vec();
                rules.insert(index + 1, copy);
                Ok(rules)
            })
        });
    Edit::finish("duplicate", query, path, result)
}

/// 切换 `path` 处节点的锁定状态, 分组会把新状态传给所有后代。
/// 祖先已锁定时不可操作; 目标自己已锁定时仍可解锁。
pub fn toggle_lock(query: &Query, path: &[usize]) -> Edit {
    let result = if path.is_empty() {
        Ok(query.with_lock_cascade(!query.is_locked))
    } else {
        rewrite_node(query, path, |node| Ok(node.with_lock_cascade(!node.is_locked())))
    };
    Edit::finish("toggle_lock", query, path, result)
}

/// 把 `patch` 合并到 `path` 处的规则上
pub fn update_rule(query: &Query, path: &[usize], patch: &RulePatch) -> Edit {
    let result = if patch.is_empty() {
        Err(Rejection::EmptyPatch)
    } else if path.is_empty() {
        Err(Rejection::NotARule)
    } else {
        rewrite_node(query, path, |node| match node {
            Node::Rule(rule) if rule.is_locked => Err(Rejection::Locked),
            Node::Rule(rule) => Ok(Node::Rule(patch.apply(rule))),
            Node::Group(_) => Err(Rejection::NotARule),
        })
    };
    Edit::finish("update_rule", query, path, result)
}

/// 把 `patch` 合并到 `path` 处的分组上, 根分组用 `[]` 表示
pub fn update_group(query: &Query, path: &[usize], patch: &GroupPatch) -> Edit {
    let result = if patch.is_empty() {
        Err(Rejection::EmptyPatch)
    } else if path.is_empty() {
        if query.is_locked {
            Err(Rejection::Locked)
        } else {
            Ok(patch.apply(query))
        }
    } else {
        rewrite_node(query, path, |node| match node {
            Node::Group(group) if group.is_locked => Err(Rejection::Locked),
            Node::Group(group) => Ok(Node::Group(patch.apply(group))),
            Node::Rule(_) => Err(Rejection::NotAGroup),
        })
    };
    Edit::finish("update_group", query, path, result)
}
