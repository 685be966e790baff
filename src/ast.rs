//! 查询树: 规则 (叶子节点) 和规则分组 (内部节点)
//!
//! 子节点放在 `Arc` 里, 每次编辑都可以复用没有改动的子树。`Query` 就是根分组。

use crate::ids::IdGenerator;
use crate::path::format_path;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;
use std::sync::Arc;

/// 查询树的根节点
pub type Query = Arc<RuleGroup>;

/// 分组内子节点之间的逻辑连接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个值, 日期按字符串传递
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    /// 保留JSON原样的数字, `18` 不会变成 `18.0`
    Number(Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// 规则的值, 形状取决于运算符的元数
///
/// 两个元素的数组总是读成 `Range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Single(Scalar),
    Range(Scalar, Scalar),
    List(Vec<Scalar>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Single(Scalar::Text(s.into()))
    }

    pub fn number(n: impl Into<Number>) -> Self {
        Value::Single(Scalar::Number(n.into()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Single(s) => write!(f, "{}", s),
            Value::Range(lo, hi) => write!(f, "[{}, {}]", lo, hi),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// 规则树的叶子节点: `field operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    /// 字段目录中的键
    pub field: String,
    /// 运算符目录中的键
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub is_locked: bool,
}

impl Rule {
    pub fn new(id: impl Into<String>, field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator: operator.into(),
            value: None,
            is_locked: false,
        }
    }

    /// 新的空白规则: 字段为空, 运算符 `equal`, 值为空字符串
    pub fn initial(ids: &dyn IdGenerator) -> Self {
        Self {
            value: Some(Value::text("")),
            ..Self::new(ids.next_id(), "", "equal")
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = is_locked;
        self
    }

    fn patched(&self, patch: &RulePatch) -> Rule {
        Rule {
            id: self.id.clone(),
            field: patch.field.clone().unwrap_or_else(|| self.field.clone()),
            operator: patch.operator.clone().unwrap_or_else(|| self.operator.clone()),
            value: patch.value.clone().unwrap_or_else(|| self.value.clone()),
            is_locked: patch.is_locked.unwrap_or(self.is_locked),
        }
    }
}

/// 规则分组, 用 combinator 连接其子节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    pub id: String,
    pub combinator: Combinator,
    /// 有序的子规则和子分组
    pub rules: Vec<Arc<Node>>,
    #[serde(default)]
    pub is_locked: bool,
}

impl RuleGroup {
    pub fn new(id: impl Into<String>, combinator: Combinator, rules: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            combinator,
            rules: rules.into_iter().map(Arc::new).collect(),
            is_locked: false,
        }
    }

    /// 新的 `and` 分组, 内含一条空白规则 (先为分组生成id)
    pub fn initial(ids: &dyn IdGenerator) -> Self {
        let id = ids.next_id();
        Self::new(id, Combinator::And, vec![Node::Rule(Rule::initial(ids))])
    }

    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = is_locked;
        self
    }

    pub fn into_query(self) -> Query {
        Arc::new(self)
    }

    /// 浅拷贝, 替换 `index` 处的子节点
    pub(crate) fn with_child(&self, index: usize, child: Arc<Node>) -> RuleGroup {
        let mut rules = self.rules.clone();
        rules[index] = child;
        RuleGroup { rules, ..self.shallow() }
    }

    /// 浅拷贝, 换上新的子节点列表
    pub(crate) fn with_rules(&self, rules: Vec<Arc<Node>>) -> RuleGroup {
        RuleGroup { rules, ..self.shallow() }
    }

    fn shallow(&self) -> RuleGroup {
        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            rules: Vec::new(),
            is_locked: self.is_locked,
        }
    }

    /// 把 `is_locked` 写到整个子树的每个节点上
    pub(crate) fn with_lock_cascade(&self, is_locked: bool) -> RuleGroup {
        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            rules: self
                .rules
                .iter()
                .map(|child| Arc::new(child.with_lock_cascade(is_locked)))
                .collect(),
            is_locked,
        }
    }

    fn patched(&self, patch: &GroupPatch) -> RuleGroup {
        RuleGroup {
            combinator: patch.combinator.unwrap_or(self.combinator),
            is_locked: patch.is_locked.unwrap_or(self.is_locked),
            ..self.clone()
        }
    }

    /// 深拷贝子树, 每个节点都换上新id
    pub(crate) fn deep_clone(&self, ids: &dyn IdGenerator) -> RuleGroup {
        RuleGroup {
            id: ids.next_id(),
            combinator: self.combinator,
            rules: self
                .rules
                .iter()
                .map(|child| Arc::new(child.deep_clone(ids)))
                .collect(),
            is_locked: self.is_locked,
        }
    }
}

/// 树节点: 分组或规则
///
/// 反序列化时先尝试分组, 同时带有 `combinator` 和 `rules` 的对象一律当作分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Group(RuleGroup),
    Rule(Rule),
}

impl Node {
    pub fn id(&self) -> &str {
        self.view().id()
    }

    pub fn is_locked(&self) -> bool {
        self.view().is_locked()
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    pub fn view(&self) -> NodeRef<'_> {
        match self {
            Node::Group(group) => NodeRef::Group(group),
            Node::Rule(rule) => NodeRef::Rule(rule),
        }
    }

    pub fn as_group(&self) -> Option<&RuleGroup> {
        self.view().as_group()
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        self.view().as_rule()
    }

    pub(crate) fn with_lock_cascade(&self, is_locked: bool) -> Node {
        match self {
            Node::Group(group) => Node::Group(group.with_lock_cascade(is_locked)),
            Node::Rule(rule) => Node::Rule(rule.clone().locked(is_locked)),
        }
    }

    pub(crate) fn deep_clone(&self, ids: &dyn IdGenerator) -> Node {
        match self {
            Node::Group(group) => Node::Group(group.deep_clone(ids)),
            Node::Rule(rule) => Node::Rule(Rule {
                id: ids.next_id(),
                ..rule.clone()
            }),
        }
    }
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Node::Rule(rule)
    }
}

impl From<RuleGroup> for Node {
    fn from(group: RuleGroup) -> Self {
        Node::Group(group)
    }
}

/// 节点的借用视图。根节点是单独的 `RuleGroup`, 所以查找返回它而不是 `&Node`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Group(&'a RuleGroup),
    Rule(&'a Rule),
}

impl<'a> NodeRef<'a> {
    pub fn id(self) -> &'a str {
        match self {
            NodeRef::Group(group) => &group.id,
            NodeRef::Rule(rule) => &rule.id,
        }
    }

    pub fn is_locked(self) -> bool {
        match self {
            NodeRef::Group(group) => group.is_locked,
            NodeRef::Rule(rule) => rule.is_locked,
        }
    }

    pub fn as_group(self) -> Option<&'a RuleGroup> {
        match self {
            NodeRef::Group(group) => Some(group),
            NodeRef::Rule(_) => None,
        }
    }

    pub fn as_rule(self) -> Option<&'a Rule> {
        match self {
            NodeRef::Rule(rule) => Some(rule),
            NodeRef::Group(_) => None,
        }
    }

    /// 拷贝出一个独立的节点
    pub fn to_node(self) -> Node {
        match self {
            NodeRef::Group(group) => Node::Group(group.clone()),
            NodeRef::Rule(rule) => Node::Rule(rule.clone()),
        }
    }
}

/// 规则的部分更新, `value: Some(None)` 表示清空值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub field: Option<String>,
    pub operator: Option<String>,
    pub value: Option<Option<Value>>,
    pub is_locked: Option<bool>,
}

impl RulePatch {
    pub fn is_empty(&self) -> bool {
        self.field.is_none()
            && self.operator.is_none()
            && self.value.is_none()
            && self.is_locked.is_none()
    }

    pub(crate) fn apply(&self, rule: &Rule) -> Rule {
        rule.patched(self)
    }
}

/// 分组的部分更新, 不会改动子节点和id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub combinator: Option<Combinator>,
    pub is_locked: Option<bool>,
}

impl GroupPatch {
    pub fn is_empty(&self) -> bool {
        self.combinator.is_none() && self.is_locked.is_none()
    }

    pub(crate) fn apply(&self, group: &RuleGroup) -> RuleGroup {
        group.patched(self)
    }
}

/// 在原始JSON上判断是否为分组: 对象同时带有 `combinator` 和 `rules`
pub fn is_rule_group(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("combinator") && obj.contains_key("rules"))
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        write_node(f, NodeRef::Group(self), &mut path)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: NodeRef<'_>, path: &mut Vec<usize>) -> fmt::Result {
    let indent = "  ".repeat(path.len());
    let lock = if node.is_locked() { " [locked]" } else { "" };
    match node {
        NodeRef::Group(group) => {
            writeln!(
                f,
                "{}{} {} ({}){}",
                indent,
                format_path(path),
                group.combinator,
                group.id,
                lock
            )?;
            for (index, child) in group.rules.iter().enumerate() {
                path.push(index);
                write_node(f, child.view(), path)?;
                path.pop();
            }
            Ok(())
        }
        NodeRef::Rule(rule) => {
            write!(f, "{}{} {} {}", indent, format_path(path), rule.field, rule.operator)?;
            if let Some(value) = &rule.value {
                write!(f, " {}", value)?;
            }
            writeln!(f, " ({}){}", rule.id, lock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use serde_json::json;

    #[test]
    fn test_initial_data() {
        let ids = SequentialIds::new("n");
        let group = RuleGroup::initial(&ids);

        assert_eq!(group.id, "n-1");
        assert_eq!(group.combinator, Combinator::And);
        assert!(!group.is_locked);
        assert_eq!(group.rules.len(), 1);

        let rule = group.rules[0].as_rule().unwrap();
        assert_eq!(rule.id, "n-2");
        assert_eq!(rule.field, "");
        assert_eq!(rule.operator, "equal");
        assert_eq!(rule.value, Some(Value::text("")));
    }

    #[test]
    fn test_deserialize_external_tree() {
        let raw = json!({
            "id": "root",
            "combinator": "or",
            "rules": [
                { "id": "r1", "field": "age", "operator": "between", "value": [18, 65] },
                { "id": "r2", "field": "tags", "operator": "in", "value": ["a", "b", "c"], "isLocked": true },
                { "id": "g1", "combinator": "and", "rules": [] }
            ]
        });

        let group: RuleGroup = serde_json::from_value(raw).unwrap();
        assert_eq!(group.combinator, Combinator::Or);
        assert!(!group.is_locked);

        let r1 = group.rules[0].as_rule().unwrap();
        assert_eq!(r1.value, Some(Value::Range(Scalar::from(18i64), Scalar::from(65i64))));

        let r2 = group.rules[1].as_rule().unwrap();
        assert!(r2.is_locked);
        assert!(matches!(r2.value, Some(Value::List(ref items)) if items.len() == 3));

        assert!(group.rules[2].is_group());
    }

    #[test]
    fn test_structural_discriminator() {
        assert!(is_rule_group(&json!({ "id": "g", "combinator": "and", "rules": [] })));
        assert!(!is_rule_group(&json!({ "id": "g", "combinator": "and" })));
        assert!(!is_rule_group(&json!({ "id": "r", "field": "x", "operator": "equal" })));
        assert!(!is_rule_group(&json!(["combinator", "rules"])));

        // 多出的规则字段不影响判断
        let node: Node = serde_json::from_value(json!({
            "id": "g", "combinator": "and", "rules": [], "field": "x", "operator": "equal"
        }))
        .unwrap();
        assert!(node.is_group());
    }

    #[test]
    fn test_numbers_keep_their_json_form() {
        let raw = r#"{"id":"r1","field":"age","operator":"between","value":[18,2.5],"isLocked":false}"#;
        let rule: Rule = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&rule).unwrap(), raw);
        assert_eq!(rule.value.unwrap().to_string(), "[18, 2.5]");
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let rule = Rule::new("r1", "name", "equal").locked(true);
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["isLocked"], json!(true));
        assert!(value.get("value").is_none());
    }

    #[test]
    fn test_rule_patch_merges_over_existing_fields() {
        let rule = Rule::new("r1", "name", "equal").with_value(Value::text("bob"));
        let patch = RulePatch {
            operator: Some("contains".to_string()),
            ..Default::default()
        };

        let patched = patch.apply(&rule);
        assert_eq!(patched.id, "r1");
        assert_eq!(patched.field, "name");
        assert_eq!(patched.operator, "contains");
        assert_eq!(patched.value, Some(Value::text("bob")));

        let cleared = RulePatch {
            value: Some(None),
            ..Default::default()
        }
        .apply(&rule);
        assert_eq!(cleared.value, None);
    }

    #[test]
    fn test_display_tree() {
        let group = RuleGroup::new(
            "root",
            Combinator::And,
            vec![
                Rule::new("r1", "status", "equal").with_value(Value::text("Open")).into(),
                RuleGroup::new("g1", Combinator::Or, vec![Rule::new("r2", "age", "is_empty").into()])
                    .locked(true)
                    .into(),
            ],
        );

        let rendered = group.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "root and (root)");
        assert_eq!(lines[1], "  0 status equal \"Open\" (r1)");
        assert_eq!(lines[2], "  1 or (g1) [locked]");
        assert_eq!(lines[3], "    1.0 age is_empty (r2)");
    }
}
