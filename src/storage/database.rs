//! 数据库存储模块
//!
//! 使用SQLite记录每次改变规则目录的合并（版本、描述更新的审计记录）

use crate::core::models::MergeRecord;
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::path::Path;

/// 数据库管理器
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 打开或创建数据库
    pub fn open(path: &Path) -> Result<Self> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_tables()?;
        Ok(db)
    }

    /// 打开内存数据库
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_tables()?;
        Ok(db)
    }

    /// 初始化表结构
    fn init_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- 合并历史表
            CREATE TABLE IF NOT EXISTS merge_history (
                batch_id TEXT PRIMARY KEY,
                executed_at TEXT NOT NULL,
                previous_version TEXT NOT NULL,
                new_version TEXT NOT NULL,
                added_count INTEGER NOT NULL,
                added_names_json TEXT NOT NULL,
                catalog_sha256 TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_merge_history_executed ON merge_history(executed_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 保存合并记录
    pub fn record_merge(&self, record: &MergeRecord) -> Result<()> {
        let added_names_json = serde_json::to_string(&record.added_names)?;
        let executed_at = record.executed_at.to_rfc3339();

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO merge_history
            (batch_id, executed_at, previous_version, new_version, added_count, added_names_json, catalog_sha256)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.batch_id,
                executed_at,
                record.previous_version,
                record.new_version,
                record.added_count() as i64,
                added_names_json,
                record.catalog_sha256,
            ],
        )?;
        Ok(())
    }

    /// 加载最近的合并记录
    ///
    /// 时间戳或新增名称无法解析的行会使整个查询失败。
    pub fn load_recent_history(&self, limit: usize) -> Result<Vec<MergeRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT batch_id, executed_at, previous_version, new_version, added_names_json, catalog_sha256
            FROM merge_history
            ORDER BY executed_at DESC
            LIMIT ?1
            "#,
        )?;

        let entries = stmt.query_map(params![limit as i64], |row| {
            let executed_at_str: String = row.get(1)?;
            let added_names_json: String = row.get(4)?;

            let executed_at = chrono::DateTime::parse_from_rfc3339(&executed_at_str)
                .map(|d| d.with_timezone(&chrono::Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
            let added_names = serde_json::from_str(&added_names_json)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

            Ok(MergeRecord {
                batch_id: row.get(0)?,
                executed_at,
                previous_version: row.get(2)?,
                new_version: row.get(3)?,
                added_names,
                catalog_sha256: row.get(5)?,
            })
        })?;

        entries.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// 清理旧的合并记录
    pub fn cleanup_old_history(&self, keep_count: usize) -> Result<usize> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM merge_history
            WHERE batch_id NOT IN (
                SELECT batch_id FROM merge_history
                ORDER BY executed_at DESC
                LIMIT ?1
            )
            "#,
            params![keep_count as i64],
        )?;
        Ok(affected)
    }
}
