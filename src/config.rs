//! 配置模块，负责加载查询构建器的JSON配置文件
//!
//! ```json
//! {
//!   "maxDepth": 3,
//!   "fields": [{ "label": "Age", "value": "age", "type": "number" }],
//!   "operatorsByFieldType": {
//!     "email": [{ "name": "Domain Is", "value": "domain_is", "type": "binary" }]
//!   }
//! }
//! ```

use crate::operators::{Field, Operator, OperatorCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "query_builder.json";

/// 配置加载错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 查询构建器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    /// 允许的最大分组嵌套层数（含根分组），None 表示不限制
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// 可选字段目录
    #[serde(default)]
    pub fields: Vec<Field>,
    /// 按字段类型覆盖默认的运算符列表
    #[serde(default)]
    pub operators_by_field_type: HashMap<String, Vec<Operator>>,
}

impl BuilderConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        Self::from_json_str(&content)
            .map_err(|e| ConfigError::new(format!("{} ({})", e.message, path_ref.display())))
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::new(format!("无法解析JSON配置: {}", e)))
    }

    /// 默认运算符目录叠加配置中的覆盖项
    pub fn operator_catalog(&self) -> OperatorCatalog {
        let mut catalog = OperatorCatalog::default();
        for (field_type, operators) in &self.operators_by_field_type {
            catalog.set(field_type.clone(), operators.clone());
        }
        catalog
    }
}
