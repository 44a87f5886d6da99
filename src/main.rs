//! remaster-rules - 去“重制版”重写规则目录维护工具
//!
//! 把新发现的候选规则合并进规则目录：
//! - 以 find 模式查重，只追加目录中没有的规则
//! - 有新增时推进版本号并更新描述
//! - 每次写回都留下合并记录

pub mod core;
pub mod storage;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::candidates::CandidateSource;
use crate::core::updater::Updater;
use crate::storage::catalog_store::JsonCatalogStore;
use crate::storage::config::ConfigManager;
use crate::storage::database::Database;

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_manager = ConfigManager::new(ConfigManager::resolve_path());
    let config = config_manager.load()?;
    tracing::info!(
        "启动 remaster-rules，配置: {}，目录: {}",
        config_manager.path().display(),
        config.catalog_path.display()
    );

    let store = JsonCatalogStore::new(config.catalog_path.clone());
    let candidates = CandidateSource::new(config.candidates_path.clone());
    let mut updater = Updater::new(store, candidates).dry_run(config.dry_run);

    if config.history_enabled {
        let history_path = config
            .history_db_path
            .clone()
            .unwrap_or_else(ConfigManager::default_history_path);
        updater = updater.with_history(Database::open(&history_path)?);
    }

    let report = updater.run()?;
    println!("{}", report);

    Ok(())
}
