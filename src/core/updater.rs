//! 目录更新流程
//!
//! 读取目录 → 合并候选规则 → 有新增时写回 → 记录合并历史 → 生成报告。
//!
//! 设计原则：
//! - 目录不存在时直接放弃，不合并也不写回
//! - 版本号错误时不写回任何内容
//! - 写回失败直接上报，不自动重试

use crate::core::candidates::CandidateSource;
use crate::core::error::CatalogError;
use crate::core::merger::merge_rules;
use crate::core::models::{Catalog, MergeRecord};
use crate::storage::catalog_store::CatalogStore;
use crate::storage::database::Database;
use anyhow::Result;
use std::fmt;

/// 一次更新的结果报告
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateReport {
    /// 目录不存在，未做任何处理
    NotFound { location: String },
    /// 所有候选规则均已收录
    UpToDate { version: String, total_rules: usize },
    /// 追加了新规则
    Updated {
        previous_version: String,
        new_version: String,
        added_names: Vec<String>,
        total_rules: usize,
        /// Dry Run 模式下不会写回
        dry_run: bool,
    },
}

impl UpdateReport {
    pub fn added_count(&self) -> usize {
        match self {
            UpdateReport::Updated { added_names, .. } => added_names.len(),
            _ => 0,
        }
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateReport::NotFound { location } => {
                write!(f, "未找到规则目录: {}", location)
            }
            UpdateReport::UpToDate { version, total_rules } => write!(
                f,
                "无需新增规则，所有模式均已收录（版本 {}，共 {} 条规则）",
                version, total_rules
            ),
            UpdateReport::Updated {
                previous_version,
                new_version,
                added_names,
                total_rules,
                dry_run,
            } => {
                for name in added_names {
                    writeln!(f, "新增规则: {}", name)?;
                }
                write!(
                    f,
                    "新增 {} 条规则，版本 {} → {}，现共 {} 条规则",
                    added_names.len(),
                    previous_version,
                    new_version,
                    total_rules
                )?;
                if *dry_run {
                    write!(f, "（Dry Run，未写回）")?;
                }
                Ok(())
            }
        }
    }
}

/// 目录更新器
pub struct Updater<S: CatalogStore> {
    store: S,
    candidates: CandidateSource,
    history: Option<Database>,
    dry_run: bool,
}

impl<S: CatalogStore> Updater<S> {
    /// 创建新的更新器
    pub fn new(store: S, candidates: CandidateSource) -> Self {
        Self {
            store,
            candidates,
            history: None,
            dry_run: false,
        }
    }

    /// 启用合并历史记录
    pub fn with_history(mut self, history: Database) -> Self {
        self.history = Some(history);
        self
    }

    /// 设置 Dry Run 模式
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn history(&self) -> Option<&Database> {
        self.history.as_ref()
    }

    /// 执行一次更新
    pub fn run(&mut self) -> Result<UpdateReport> {
        tracing::info!("读取规则目录: {}", self.store.location());
        let catalog = match self.store.load() {
            Ok(catalog) => catalog,
            Err(CatalogError::NotFound(location)) => {
                tracing::warn!("未找到规则目录: {}", location);
                return Ok(UpdateReport::NotFound { location });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("当前规则数: {}", catalog.rules.len());

        let candidates = self.candidates.collect()?;
        let previous_version = catalog.version.clone();
        let outcome = merge_rules(catalog, candidates)?;

        if !outcome.changed() {
            tracing::info!("无需新增规则");
            return Ok(UpdateReport::UpToDate {
                version: outcome.catalog.version,
                total_rules: outcome.catalog.rules.len(),
            });
        }

        for name in &outcome.added_names {
            tracing::info!("新增规则: {}", name);
        }

        if self.dry_run {
            tracing::info!("Dry Run 模式，跳过写回");
        } else {
            self.store.save(&outcome.catalog)?;
            self.record_history(&previous_version, &outcome.added_names, &outcome.catalog);
        }

        tracing::info!(
            "新增 {} 条规则，新版本: {}",
            outcome.added_count,
            outcome.catalog.version
        );

        Ok(UpdateReport::Updated {
            previous_version,
            new_version: outcome.catalog.version.clone(),
            added_names: outcome.added_names,
            total_rules: outcome.catalog.rules.len(),
            dry_run: self.dry_run,
        })
    }

    /// 目录已写回，历史记录失败只告警
    fn record_history(
        &self,
        previous_version: &str,
        added_names: &[String],
        catalog: &Catalog,
    ) {
        let Some(ref db) = self.history else {
            return;
        };

        let result = MergeRecord::new(previous_version.to_string(), added_names.to_vec(), catalog)
            .map_err(anyhow::Error::from)
            .and_then(|record| db.record_merge(&record));

        if let Err(e) = result {
            tracing::warn!("记录合并历史失败: {}", e);
        }
    }
}
