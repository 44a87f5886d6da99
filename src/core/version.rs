//! 目录版本号
//!
//! 版本号为 `MAJOR.MINOR`，合并新增规则时只推进 MINOR。

use crate::core::error::CatalogError;
use std::fmt;

/// 解析后的目录版本号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogVersion {
    pub major: u64,
    pub minor: u64,
    /// MINOR 之后的附加段，原样保留
    trailing: Vec<String>,
}

impl CatalogVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            major,
            minor,
            trailing: Vec::new(),
        }
    }

    /// 解析版本字符串，至少需要两个整数段
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let malformed = || CatalogError::MalformedVersion(raw.to_string());
        let mut parts = raw.split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(malformed)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(malformed)?;

        Ok(Self {
            major,
            minor,
            trailing: parts.map(str::to_string).collect(),
        })
    }

    /// 返回 MINOR 加一后的版本，MINOR 已到上限时视为格式错误
    pub fn bumped(&self) -> Result<Self, CatalogError> {
        let minor = self
            .minor
            .checked_add(1)
            .ok_or_else(|| CatalogError::MalformedVersion(self.to_string()))?;
        Ok(Self {
            minor,
            ..self.clone()
        })
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        for part in &self.trailing {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}
