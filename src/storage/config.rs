//! 配置文件管理模块

use crate::core::models::AppConfig;
use anyhow::Result;
use std::path::PathBuf;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "REMASTER_RULES_CONFIG";

/// 配置管理器
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "scrobble-scrubber", "remaster-rules")
    }

    /// 获取默认配置路径
    pub fn default_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// 获取默认合并历史数据库路径
    pub fn default_history_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("history.db"))
            .unwrap_or_else(|| PathBuf::from("history.db"))
    }

    /// 环境变量优先，否则使用默认路径
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path)
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// 加载配置
    pub fn load(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            let content = std::fs::read_to_string(&self.config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// 保存配置
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// 重置为默认配置
    pub fn reset(&self) -> Result<()> {
        self.save(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let manager = ConfigManager::new(config_path);

        let mut config = AppConfig::default();
        config.dry_run = true;
        config.candidates_path = Some(PathBuf::from("extra.json"));

        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert!(loaded.dry_run);
        assert_eq!(loaded.candidates_path, Some(PathBuf::from("extra.json")));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("absent.json"));

        let config = manager.load().unwrap();
        assert_eq!(
            config.catalog_path,
            PathBuf::from("app/assets/default_remaster_rules.json")
        );
        assert!(config.history_enabled);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"catalog_path": "rules.json"}"#).unwrap();

        let config = ConfigManager::new(config_path).load().unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("rules.json"));
        assert!(config.history_enabled);
    }

    #[test]
    fn test_reset() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("config.json"));
        manager.save(&AppConfig { dry_run: true, ..Default::default() }).unwrap();

        manager.reset().unwrap();
        assert!(!manager.load().unwrap().dry_run);
    }
}
