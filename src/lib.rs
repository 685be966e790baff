//! 无界面的查询构建引擎
//!
//! 查询是由规则和规则分组组成的树。编辑操作按路径寻址节点并返回新的根节点,
//! 没有改动的子树与上一版本共享。

pub mod ast;
pub mod builder;
pub mod command;
pub mod config;
pub mod edit;
pub mod ids;
pub mod operators;
pub mod path;
pub mod reorder;

#[cfg(test)]
mod test_support;
