//! Core模块 - 规则目录的数据模型与合并逻辑

pub mod error;
pub mod models;
pub mod version;
pub mod candidates;
pub mod merger;
pub mod updater;
