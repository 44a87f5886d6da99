//! 核心数据模型定义
//!
//! 规则目录写回时必须保持原有字段，因此规则上无法识别的字段会被原样保留。

use crate::core::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// 匹配/替换模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// 匹配模式（正则字符串，本模块不编译也不执行）
    pub find: String,
    /// 替换模板，支持 `$1` 等捕获组引用
    pub replace: String,
}

impl PatternSpec {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// 规则作用的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// 曲目名（`track_name`）
    TrackName(PatternSpec),
    /// 专辑名（`album_name`）
    AlbumName(PatternSpec),
    /// 其它字段（如 `artist_name`、`album_artist_name`），模式保存在 `extra` 中。
    /// 只会出现在已有目录里，候选规则不允许使用
    Other,
}

impl RuleTarget {
    pub fn pattern(&self) -> Option<&PatternSpec> {
        match self {
            RuleTarget::TrackName(p) | RuleTarget::AlbumName(p) => Some(p),
            RuleTarget::Other => None,
        }
    }
}

/// 重写规则
///
/// 规则的身份由 find 模式决定，名称只是约定上唯一。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub struct Rule {
    /// 规则名称（用于显示）
    pub name: String,
    /// 说明文字
    pub description: String,
    /// 示例（仅作文档，不会执行）
    pub examples: Vec<String>,
    /// 作用字段与模式
    pub target: RuleTarget,
    /// 应用到真实数据前是否需要用户确认
    pub requires_confirmation: bool,
    /// 其它未识别字段（如 artist_name），写回时原样保留
    pub extra: Map<String, Value>,
}

impl Rule {
    /// 创建新规则
    pub fn new(name: impl Into<String>, target: RuleTarget) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            examples: Vec::new(),
            target,
            requires_confirmation: false,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// 去重用的身份键：目标字段的 find 模式，其它字段的规则没有身份键
    pub fn identity_key(&self) -> Option<&str> {
        self.target.pattern().map(|p| p.find.as_str())
    }

    pub fn is_track_rule(&self) -> bool {
        matches!(self.target, RuleTarget::TrackName(_))
    }

    /// 把松散记录转换为候选规则，缺少 track_name 与 album_name 时报错
    pub fn candidate(record: RuleRecord) -> Result<Self, CatalogError> {
        let rule = Self::try_from(record)?;
        match rule.target {
            RuleTarget::Other => Err(CatalogError::MalformedCandidate { name: rule.name }),
            _ => Ok(rule),
        }
    }
}

/// 规则的松散记录形式，与持久化格式一一对应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<PatternSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_name: Option<PatternSpec>,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = CatalogError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let RuleRecord {
            name,
            description,
            examples,
            track_name,
            album_name,
            requires_confirmation,
            mut extra,
        } = record;

        let target = match (track_name, album_name) {
            (Some(track), album) => {
                // 两者都有时以 track_name 为准，album_name 作为附加字段保留
                if let Some(album) = album {
                    extra.insert("album_name".to_string(), serde_json::to_value(album)?);
                }
                RuleTarget::TrackName(track)
            }
            (None, Some(album)) => RuleTarget::AlbumName(album),
            (None, None) => RuleTarget::Other,
        };

        Ok(Self {
            name,
            description,
            examples,
            target,
            requires_confirmation,
            extra,
        })
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        let (track_name, album_name) = match rule.target {
            RuleTarget::TrackName(p) => (Some(p), None),
            RuleTarget::AlbumName(p) => (None, Some(p)),
            RuleTarget::Other => (None, None),
        };

        Self {
            name: rule.name,
            description: rule.description,
            examples: rule.examples,
            track_name,
            album_name,
            requires_confirmation: rule.requires_confirmation,
            extra: rule.extra,
        }
    }
}

/// 规则目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// 版本号（MAJOR.MINOR），缺失时视为格式错误
    pub version: String,
    /// 目录说明，包含样本来源
    #[serde(default)]
    pub description: String,
    /// 规则列表，顺序有意义（执行引擎按首个匹配生效）
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Catalog {
    pub fn new(version: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            rules: Vec::new(),
        }
    }

    /// 目录内容的 SHA-256 指纹（十六进制）
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        use sha2::{Digest, Sha256};

        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// 合并记录 - 每次改变目录的合并都会留下一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRecord {
    /// 批次ID
    pub batch_id: String,
    /// 执行时间
    pub executed_at: DateTime<Utc>,
    /// 合并前版本
    pub previous_version: String,
    /// 合并后版本
    pub new_version: String,
    /// 新增规则名称（按追加顺序）
    pub added_names: Vec<String>,
    /// 保存后目录的指纹
    pub catalog_sha256: String,
}

impl MergeRecord {
    /// 根据合并后的目录创建记录
    pub fn new(
        previous_version: String,
        added_names: Vec<String>,
        catalog: &Catalog,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            executed_at: Utc::now(),
            previous_version,
            new_version: catalog.version.clone(),
            added_names,
            catalog_sha256: catalog.fingerprint()?,
        })
    }

    pub fn added_count(&self) -> usize {
        self.added_names.len()
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 规则目录文件路径
    pub catalog_path: PathBuf,
    /// 额外候选规则文件（JSON 数组），追加在内置候选之后
    pub candidates_path: Option<PathBuf>,
    /// 是否记录合并历史
    pub history_enabled: bool,
    /// 合并历史数据库路径，未设置时使用数据目录下的 history.db
    pub history_db_path: Option<PathBuf>,
    /// Dry Run：只合并并报告，不写回
    pub dry_run: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("app/assets/default_remaster_rules.json"),
            candidates_path: None,
            history_enabled: true,
            history_db_path: None,
            dry_run: false,
        }
    }
}
