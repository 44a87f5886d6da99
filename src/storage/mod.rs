//! Storage模块 - 规则目录文件、配置与合并历史

pub mod catalog_store;
pub mod config;
pub mod database;
