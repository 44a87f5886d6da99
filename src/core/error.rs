//! 目录维护过程中的错误类型

/// 规则目录相关错误
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// 目录不存在或不可读，调用方应直接放弃本次合并
    #[error("规则目录不存在: {0}")]
    NotFound(String),

    /// 版本号不是 MAJOR.MINOR 形式，不允许回退到默认版本
    #[error("版本号格式错误: `{0}`（应为 MAJOR.MINOR）")]
    MalformedVersion(String),

    /// 候选规则既没有 track_name 也没有 album_name
    #[error("规则 `{name}` 缺少 track_name 与 album_name")]
    MalformedCandidate { name: String },

    /// 目录文档结构不正确
    #[error("规则目录格式错误: {0}")]
    MalformedCatalog(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
