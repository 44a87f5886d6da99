//! 候选规则来源
//!
//! 内置一组从 Last.fm 曲目样本中整理出的去“重制版”规则，
//! 也可以从 JSON 文件追加候选。文件中的记录是松散格式，
//! 既没有 track_name 也没有 album_name 的记录会被跳过。

use crate::core::error::{CatalogError, Result};
use crate::core::models::{PatternSpec, Rule, RuleRecord, RuleTarget};
use std::path::{Path, PathBuf};

fn album(name: &str, description: &str, examples: &[&str], find: &str) -> Rule {
    Rule::new(name, RuleTarget::AlbumName(PatternSpec::new(find, "$1")))
        .with_description(description)
        .with_examples(examples.iter().copied())
}

fn track(name: &str, description: &str, examples: &[&str], find: &str) -> Rule {
    Rule::new(name, RuleTarget::TrackName(PatternSpec::new(find, "$1")))
        .with_description(description)
        .with_examples(examples.iter().copied())
}

/// 内置候选规则（顺序即追加顺序）
pub fn builtin_candidates() -> Vec<Rule> {
    vec![
        // 专辑名规则
        album(
            "Remove Anniversary Edition from Album",
            "Removes patterns like 'Album (50th Anniversary Edition)' from album names",
            &[
                "Abbey Road (50th Anniversary Edition) → Abbey Road",
                "Pet Sounds (50th Anniversary Edition) → Pet Sounds",
            ],
            r"^(.+?) \(\d+th Anniversary Edition\)$",
        ),
        album(
            "Remove Deluxe Remaster Album",
            "Removes patterns like 'Album (Deluxe Remaster)' from album names",
            &["Dark Side of the Moon (Deluxe Remaster) → Dark Side of the Moon"],
            r"^(.+?) \(Deluxe Remaster\)$",
        ),
        album(
            "Remove Super Deluxe Edition Album",
            "Removes patterns like 'Album (Super Deluxe Edition)' from album names",
            &["The White Album (Super Deluxe Edition) → The White Album"],
            r"^(.+?) \(Super Deluxe Edition\)$",
        ),
        // 曲目名规则
        track(
            "Remove HD Remastered",
            "Removes patterns like 'Song - HD Remastered'",
            &["Bohemian Rhapsody - HD Remastered → Bohemian Rhapsody"],
            r"^(.+?) - HD Remastered$",
        ),
        track(
            "Remove Hi-Res Remaster",
            "Removes patterns like 'Song - Hi-Res Remaster'",
            &["Stairway to Heaven - Hi-Res Remaster → Stairway to Heaven"],
            r"^(.+?) - Hi-Res Remaster$",
        ),
        track(
            "Remove Stereo Remaster",
            "Removes patterns like 'Song - Stereo Remaster' or 'Song - 2009 Stereo Remaster'",
            &[
                "Come Together - 2009 Stereo Remaster → Come Together",
                "Here Comes the Sun - Stereo Remaster → Here Comes the Sun",
            ],
            r"^(.+?) - (\d{4} )?Stereo Remaster$",
        ),
        track(
            "Remove Mono Remaster",
            "Removes patterns like 'Song - Mono Remaster' or 'Song - 2014 Mono Remaster'",
            &["I Want to Hold Your Hand - 2014 Mono Remaster → I Want to Hold Your Hand"],
            r"^(.+?) - (\d{4} )?Mono Remaster$",
        ),
        track(
            "Remove Expanded Edition Track",
            "Removes patterns like 'Song - Expanded Edition'",
            &["Norwegian Wood - Expanded Edition → Norwegian Wood"],
            r"^(.+?) - Expanded Edition$",
        ),
        track(
            "Remove Collector's Edition Track",
            "Removes patterns like 'Song - Collector's Edition'",
            &["Love Me Do - Collector's Edition → Love Me Do"],
            r"^(.+?) - Collector's Edition$",
        ),
        track(
            "Remove Anniversary Remaster Track",
            "Removes patterns like 'Song - 50th Anniversary Remaster'",
            &[
                "Yesterday - 50th Anniversary Remaster → Yesterday",
                "Help! - 25th Anniversary Remaster → Help!",
            ],
            r"^(.+?) - \d+th Anniversary Remaster$",
        ),
        track(
            "Remove Special Edition Track",
            "Removes patterns like 'Song - Special Edition'",
            &["Revolution - Special Edition → Revolution"],
            r"^(.+?) - Special Edition$",
        ),
        track(
            "Remove Year Digital Remaster with Extra Info",
            "Removes patterns like 'Song - 2009 Digital Remaster / Extra Info'",
            &["The End - 2009 Digital Remaster / Medley → The End"],
            r"^(.+?) - \d{4} Digital Remaster / .*$",
        ),
    ]
}

/// 一批从文件解析出的候选规则
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    /// 有效候选（保持文件中的顺序）
    pub rules: Vec<Rule>,
    /// 被跳过的记录数
    pub skipped: usize,
}

/// 从JSON数组解析候选规则
pub fn parse_candidates(json_str: &str) -> Result<CandidateBatch> {
    let records: Vec<RuleRecord> = serde_json::from_str(json_str)?;
    let mut batch = CandidateBatch::default();

    for (index, record) in records.into_iter().enumerate() {
        match Rule::candidate(record) {
            Ok(rule) => batch.rules.push(rule),
            Err(e) => {
                tracing::warn!("跳过第 {} 条候选规则: {}", index, e);
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

/// 从文件加载候选规则
pub fn load_candidates_file(path: &Path) -> Result<CandidateBatch> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_candidates(&content)
}

/// 候选规则来源：内置候选，其后是可选的候选文件
#[derive(Debug, Clone, Default)]
pub struct CandidateSource {
    extra_file: Option<PathBuf>,
}

impl CandidateSource {
    pub fn new(extra_file: Option<PathBuf>) -> Self {
        Self { extra_file }
    }

    /// 仅使用内置候选
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// 按顺序收集全部候选
    pub fn collect(&self) -> Result<Vec<Rule>> {
        let mut rules = builtin_candidates();

        if let Some(ref path) = self.extra_file {
            let batch = load_candidates_file(path)?;
            tracing::info!(
                "从 {} 读取候选规则 {} 条，跳过 {} 条",
                path.display(),
                batch.rules.len(),
                batch.skipped
            );
            rules.extend(batch.rules);
        }

        Ok(rules)
    }
}
