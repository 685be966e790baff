//! 编辑会话: 当前的查询快照, 加上编辑原语需要的配置和id来源
//!
//! 每个方法对持有的快照执行一个原语, 只有编辑生效时才保留结果。
//! 之前通过 [`QueryBuilder::query`] 拿到的旧快照保持有效且不变。

use crate::ast::{GroupPatch, Query, Rule, RuleGroup, RulePatch};
use crate::config::BuilderConfig;
use crate::edit::{self, Edit, Rejection};
use crate::ids::{IdGenerator, UuidIds};
use crate::operators::{field_map, Field, Operator, OperatorCatalog};
use crate::path::{find_node_by_id, node_at_path};
use crate::reorder;
use std::sync::Arc;

pub struct QueryBuilder {
    query: Query,
    /// 新分组的最大嵌套层数 (包含根)
    max_depth: Option<usize>,
    ids: Arc<dyn IdGenerator>,
    fields: Vec<Field>,
    catalog: OperatorCatalog,
}

impl QueryBuilder {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            max_depth: None,
            ids: Arc::new(UuidIds),
            fields: Vec::new(),
            catalog: OperatorCatalog::default(),
        }
    }

    pub fn from_config(config: BuilderConfig, query: Query) -> Self {
        let catalog = config.operator_catalog();
        Self {
            max_depth: config.max_depth,
            fields: config.fields,
            catalog,
            ..Self::new(query)
        }
    }

    /// 从新的根分组开始的会话, 根分组和它的第一条规则都从 `ids` 取id
    pub fn blank(config: BuilderConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let query = RuleGroup::initial(ids.as_ref()).into_query();
        Self::from_config(config, query).with_ids(ids)
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// 换成外部构造的树, 例如从文件加载的
    pub fn replace(&mut self, query: Query) {
        self.query = query;
    }

    fn commit(&mut self, edit: Edit) -> Edit {
        if edit.applied() {
            self.query = Arc::clone(&edit.query);
        }
        edit
    }

    /// 向 `path` 处的分组追加一条空白规则
    pub fn add_rule(&mut self, path: &[usize]) -> Edit {
        let rule = Rule::initial(self.ids.as_ref());
        self.commit(edit::add(&self.query, path, rule))
    }

    /// 向 `path` 处的分组追加新分组; 新分组达到最大嵌套层数时拒绝
    pub fn add_group(&mut self, path: &[usize]) -> Edit {
        if self.max_depth.is_some_and(|max| path.len() + 1 >= max) {
            return Edit::finish("add_group", &self.query, path, Err(Rejection::MaxDepth));
        }
        let group = RuleGroup::initial(self.ids.as_ref());
        self.commit(edit::add(&self.query, path, group))
    }

    pub fn update_rule(&mut self, path: &[usize], patch: &RulePatch) -> Edit {
        self.commit(edit::update_rule(&self.query, path, patch))
    }

    pub fn update_group(&mut self, path: &[usize], patch: &GroupPatch) -> Edit {
        self.commit(edit::update_group(&self.query, path, patch))
    }

    pub fn remove(&mut self, path: &[usize]) -> Edit {
        self.commit(edit::remove(&self.query, path))
    }

    pub fn clone_node(&mut self, path: &[usize]) -> Edit {
        let edit = edit::duplicate(&self.query, path, self.ids.as_ref());
        self.commit(edit)
    }

    pub fn toggle_lock(&mut self, path: &[usize]) -> Edit {
        self.commit(edit::toggle_lock(&self.query, path))
    }

    /// 不受 `max_depth` 限制, 需要该检查的调用方先用 [`reorder::is_invalid_drop`]
    pub fn move_node(&mut self, from: &[usize], to: &[usize]) -> Edit {
        self.commit(reorder::move_node(&self.query, from, to))
    }

    /// `id` 对应节点的路径
    pub fn find(&self, id: &str) -> Option<Vec<usize>> {
        find_node_by_id(&self.query, id).map(|found| found.path)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// 按字段类型给出 `path` 处规则可用的运算符
    pub fn operators_at(&self, path: &[usize]) -> &[Operator] {
        let Some(rule) = node_at_path(&self.query, path).and_then(|node| node.as_rule()) else {
            return &[];
        };
        self.catalog.operators_for_rule(rule, &field_map(&self.fields))
    }
}
