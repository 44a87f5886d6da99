//! 规则目录存储
//!
//! 目录文件写回时只改动 version、description 以及 rules 末尾新增的条目，
//! 其余顶层字段（如 title）和已有规则对象按读入时的原样与顺序写回。

use crate::core::error::{CatalogError, Result};
use crate::core::models::{Catalog, Rule};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// 目录存储接口
pub trait CatalogStore {
    /// 读取当前目录，不存在时返回 `CatalogError::NotFound`
    fn load(&mut self) -> Result<Catalog>;

    /// 持久化目录
    fn save(&mut self, catalog: &Catalog) -> Result<()>;

    /// 存储位置（用于报告）
    fn location(&self) -> String;
}

/// JSON 文件目录存储
pub struct JsonCatalogStore {
    path: PathBuf,
    /// 最近一次读入的原始文档
    document: Option<Map<String, Value>>,
}

impl JsonCatalogStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 在原始文档上应用目录的变化
    fn merge_into_document(document: &mut Map<String, Value>, catalog: &Catalog) -> Result<()> {
        document.insert("version".to_string(), Value::String(catalog.version.clone()));
        document.insert(
            "description".to_string(),
            Value::String(catalog.description.clone()),
        );

        if let Some(raw_rules) = document.get_mut("rules").and_then(Value::as_array_mut) {
            raw_rules.truncate(catalog.rules.len());
            for (index, rule) in catalog.rules.iter().enumerate() {
                match raw_rules.get_mut(index) {
                    // 内容未变的条目保持原始 JSON
                    Some(raw) => {
                        let unchanged = serde_json::from_value::<Rule>(raw.clone())
                            .map(|loaded| &loaded == rule)
                            .unwrap_or(false);
                        if !unchanged {
                            *raw = serde_json::to_value(rule)?;
                        }
                    }
                    None => raw_rules.push(serde_json::to_value(rule)?),
                }
            }
        } else {
            document.insert("rules".to_string(), serde_json::to_value(&catalog.rules)?);
        }

        Ok(())
    }

    fn write_atomically(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&mut self) -> Result<Catalog> {
        if !self.path.exists() {
            return Err(CatalogError::NotFound(self.location()));
        }

        let content = fs::read_to_string(&self.path)?;
        let document = match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => map,
            other => {
                return Err(CatalogError::MalformedCatalog(format!(
                    "顶层应为对象，实际为 {}",
                    json_kind(&other)
                )))
            }
        };

        let catalog: Catalog = serde_json::from_value(Value::Object(document.clone()))?;
        self.document = Some(document);
        Ok(catalog)
    }

    fn save(&mut self, catalog: &Catalog) -> Result<()> {
        let mut document = match self.document.take() {
            Some(doc) => doc,
            None => match serde_json::to_value(catalog)? {
                Value::Object(map) => map,
                _ => return Err(CatalogError::MalformedCatalog("目录无法序列化为对象".into())),
            },
        };

        Self::merge_into_document(&mut document, catalog)?;

        let mut content = serde_json::to_string_pretty(&document)?;
        content.push('\n');
        self.write_atomically(&content)?;

        tracing::info!("规则目录已保存到 {}", self.location());
        self.document = Some(document);
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "数组",
        Value::Object(_) => "对象",
    }
}

/// 内存目录存储
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    catalog: Option<Catalog>,
    /// 保存次数
    pub saves: usize,
}

impl MemoryCatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Some(catalog),
            saves: 0,
        }
    }

    /// 不含目录的空存储
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load(&mut self) -> Result<Catalog> {
        self.catalog
            .clone()
            .ok_or_else(|| CatalogError::NotFound(self.location()))
    }

    fn save(&mut self, catalog: &Catalog) -> Result<()> {
        self.catalog = Some(catalog.clone());
        self.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
