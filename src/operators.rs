//! 字段和运算符目录
//!
//! 规则树本身不读取目录: 规则的 `field` 和 `operator` 只是键。
//! 前端用目录来给出可选项。

use crate::ast::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 运算符的元数, 决定规则值的形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorType {
    /// 无值
    Unary,
    /// 单个值
    Binary,
    /// 两个值: 下限和上限
    Range,
    /// 任意个值
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// 显示名称
    pub name: String,
    /// 保存在规则上的键
    pub value: String,
    #[serde(rename = "type")]
    pub kind: OperatorType,
}

impl Operator {
    pub fn new(name: &str, value: &str, kind: OperatorType) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            kind,
        }
    }
}

/// 可选字段。`kind` 可以是任意字符串, 其中 `string`、`number`、`boolean`、`date` 有内置的运算符列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

const BUILTIN: &[(&str, &str, OperatorType)] = &[
    ("is_empty", "Is Empty", OperatorType::Unary),
    ("is_not_empty", "Is Not Empty", OperatorType::Unary),
    ("is_true", "Is True", OperatorType::Unary),
    ("is_false", "Is False", OperatorType::Unary),
    ("equal", "Equal", OperatorType::Binary),
    ("not_equal", "Not Equal", OperatorType::Binary),
    ("less", "Less Than", OperatorType::Binary),
    ("less_or_equal", "Less Than or Equal", OperatorType::Binary),
    ("greater", "Greater Than", OperatorType::Binary),
    ("greater_or_equal", "Greater Than or Equal", OperatorType::Binary),
    ("contains", "Contains", OperatorType::Binary),
    ("starts_with", "Starts With", OperatorType::Binary),
    ("ends_with", "Ends With", OperatorType::Binary),
    ("between", "Between", OperatorType::Range),
    ("not_between", "Not Between", OperatorType::Range),
    ("in", "In", OperatorType::List),
    ("not_in", "Not In", OperatorType::List),
];

const STRING_OPERATORS: &[&str] = &[
    "is_empty", "is_not_empty", "equal", "not_equal", "contains", "starts_with", "ends_with", "in", "not_in",
];

const ORDERED_OPERATORS: &[&str] = &[
    "is_empty",
    "is_not_empty",
    "equal",
    "not_equal",
    "less",
    "less_or_equal",
    "greater",
    "greater_or_equal",
    "between",
    "not_between",
    "in",
    "not_in",
];

const BOOLEAN_OPERATORS: &[&str] = &["is_empty", "is_not_empty", "is_true", "is_false"];

/// 按键查找内置运算符
pub fn operator_by_key(key: &str) -> Option<Operator> {
    BUILTIN
        .iter()
        .find(|(value, _, _)| *value == key)
        .map(|(value, name, kind)| Operator::new(name, value, *kind))
}

fn builtin_list(keys: &[&str]) -> Vec<Operator> {
    keys.iter().filter_map(|key| operator_by_key(key)).collect()
}

/// 每种字段类型可用的运算符
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCatalog {
    by_field_type: HashMap<String, Vec<Operator>>,
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        let mut by_field_type = HashMap::new();
        by_field_type.insert("string".to_string(), builtin_list(STRING_OPERATORS));
        by_field_type.insert("number".to_string(), builtin_list(ORDERED_OPERATORS));
        by_field_type.insert("boolean".to_string(), builtin_list(BOOLEAN_OPERATORS));
        by_field_type.insert("date".to_string(), builtin_list(ORDERED_OPERATORS));
        Self { by_field_type }
    }
}

impl OperatorCatalog {
    /// 替换 (或新增) 某个字段类型的运算符列表
    pub fn set(&mut self, field_type: impl Into<String>, operators: Vec<Operator>) {
        self.by_field_type.insert(field_type.into(), operators);
    }

    /// 未知字段类型返回空列表
    pub fn operators_for(&self, field_type: &str) -> &[Operator] {
        self.by_field_type
            .get(field_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `rule` 当前字段对应的运算符
    pub fn operators_for_rule<'a>(&'a self, rule: &Rule, fields: &HashMap<&str, &Field>) -> &'a [Operator] {
        selected_field(rule, fields)
            .map(|field| self.operators_for(&field.kind))
            .unwrap_or(&[])
    }
}

/// 以键为索引的字段表
pub fn field_map(fields: &[Field]) -> HashMap<&str, &Field> {
    fields.iter().map(|field| (field.value.as_str(), field)).collect()
}

pub fn selected_field<'a>(rule: &Rule, fields: &HashMap<&str, &'a Field>) -> Option<&'a Field> {
    fields.get(rule.field.as_str()).copied()
}
