//! 单元测试共用的规则树

use crate::ast::{Combinator, Node, Query, Rule, RuleGroup, Value};
use std::sync::Arc;

pub fn rule(id: &str) -> Node {
    Rule::new(id, "name", "equal").with_value(Value::text(id)).into()
}

pub fn group(id: &str, combinator: Combinator, rules: Vec<Node>) -> Node {
    RuleGroup::new(id, combinator, rules).into()
}

/// ```text
/// root (and)
/// ├─ 0     r1
/// └─ 1     g1 (or)
///    ├─ 1.0   r2
///    └─ 1.1   g2 (and)
///       ├─ 1.1.0 r3
///       └─ 1.1.1 r4
/// ```
pub fn sample_tree() -> Query {
    RuleGroup::new(
        "root",
        Combinator::And,
        vec![
            rule("r1"),
            group(
                "g1",
                Combinator::Or,
                vec![
                    rule("r2"),
                    group("g2", Combinator::And, vec![rule("r3"), rule("r4")]),
                ],
            ),
        ],
    )
    .into_query()
}

/// 只锁定 `g1` 的 `sample_tree`, 它的子节点仍是 `is_locked: false`
pub fn tree_with_locked_group() -> Query {
    let tree = sample_tree();
    let mut root = (*tree).clone();
    let g1 = root.rules[1].as_group().unwrap().clone().locked(true);
    root.rules[1] = Arc::new(g1.into());
    root.into_query()
}

/// 根分组下只有规则 `r0..r{n-1}`
pub fn flat_tree(n: usize) -> Query {
    let rules = (0..n).map(|i| rule(&format!("r{}", i))).collect();
    RuleGroup::new("root", Combinator::And, rules).into_query()
}

/// 分组直接子节点的id
pub fn child_ids(group: &RuleGroup) -> Vec<String> {
    group.rules.iter().map(|n| n.id().to_string()).collect()
}

/// 前序遍历得到的所有id
pub fn all_ids(group: &RuleGroup) -> Vec<String> {
    let mut out = vec![group.id.clone()];
    for child in &group.rules {
        match child.as_ref() {
            Node::Group(g) => out.extend(all_ids(g)),
            Node::Rule(r) => out.push(r.id.clone()),
        }
    }
    out
}
