//! 规则合并引擎
//!
//! 以 find 模式作为规则身份，把目录中尚未收录的候选规则按原顺序追加到末尾，
//! 并推进版本号、改写描述。纯函数，不做任何 I/O。
//!
//! 已有身份键只取自 `track_name` 规则：专辑规则不参与查重的“已存在”集合，
//! 但专辑候选仍会与该集合比对。集合在一次合并过程中不会更新，
//! 因此同一批里 find 相同的两个新候选会被同时追加。

use crate::core::error::Result;
use crate::core::models::{Catalog, Rule};
use crate::core::version::CatalogVersion;
use std::collections::HashSet;

/// 描述中的样本规模（固定值，不重新统计）
pub const SAMPLE_SIZE_NOTE: &str = "600+";

/// 合并结果
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// 合并后的目录
    pub catalog: Catalog,
    /// 新增规则数量
    pub added_count: usize,
    /// 新增规则名称（按追加顺序）
    pub added_names: Vec<String>,
}

impl MergeOutcome {
    /// 目录是否发生了变化（决定是否需要写回）
    pub fn changed(&self) -> bool {
        self.added_count > 0
    }
}

/// 新增规则后的目录描述
pub fn updated_description(added_count: usize) -> String {
    format!(
        "Comprehensive set of rewrite rules to remove remaster information from track and album names, \
         based on analysis of {} real Last.fm tracks. Updated with {} additional patterns.",
        SAMPLE_SIZE_NOTE, added_count
    )
}

/// 收集已有的身份键（仅 track_name 规则）
pub fn existing_track_keys(rules: &[Rule]) -> HashSet<String> {
    rules
        .iter()
        .filter(|r| r.is_track_rule())
        .filter_map(|r| r.identity_key())
        .map(str::to_string)
        .collect()
}

/// 把候选规则合并进目录
///
/// 版本号格式错误时返回 `MalformedVersion`，此时不会产生任何部分更新的目录。
pub fn merge_rules<I>(mut catalog: Catalog, candidates: I) -> Result<MergeOutcome>
where
    I: IntoIterator<Item = Rule>,
{
    let existing = existing_track_keys(&catalog.rules);

    let new_rules: Vec<Rule> = candidates
        .into_iter()
        .filter(|candidate| match candidate.identity_key() {
            Some(key) => !existing.contains(key),
            // 没有身份键的候选直接跳过
            None => false,
        })
        .collect();

    if new_rules.is_empty() {
        return Ok(MergeOutcome {
            catalog,
            added_count: 0,
            added_names: Vec::new(),
        });
    }

    // 先解析版本号，失败时目录保持原样
    let next_version = CatalogVersion::parse(&catalog.version)?.bumped()?;

    let added_names: Vec<String> = new_rules.iter().map(|r| r.name.clone()).collect();
    let added_count = new_rules.len();

    catalog.rules.extend(new_rules);
    catalog.version = next_version.to_string();
    catalog.description = updated_description(added_count);

    Ok(MergeOutcome {
        catalog,
        added_count,
        added_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CatalogError;
    use crate::core::models::{PatternSpec, RuleTarget};

    fn track_rule(name: &str, find: &str) -> Rule {
        Rule::new(name, RuleTarget::TrackName(PatternSpec::new(find, "$1")))
    }

    fn album_rule(name: &str, find: &str) -> Rule {
        Rule::new(name, RuleTarget::AlbumName(PatternSpec::new(find, "$1")))
    }

    fn catalog_with(version: &str, rules: Vec<Rule>) -> Catalog {
        let mut catalog = Catalog::new(version, "Initial rules");
        catalog.rules = rules;
        catalog
    }

    #[test]
    fn test_adds_only_new_track_rule() {
        let catalog = catalog_with(
            "1.2",
            vec![track_rule("Remove Remastered", "^(.+) - Remastered$")],
        );
        let candidates = vec![
            track_rule("Remove Remastered Again", "^(.+) - Remastered$"),
            track_rule("Remove HD Remastered", "^(.+) - HD Remastered$"),
        ];

        let outcome = merge_rules(catalog, candidates).unwrap();

        assert_eq!(outcome.added_count, 1);
        assert_eq!(outcome.added_names, vec!["Remove HD Remastered"]);
        assert_eq!(outcome.catalog.rules.len(), 2);
        assert_eq!(outcome.catalog.version, "1.3");
        assert_eq!(outcome.catalog.description, updated_description(1));
        assert!(outcome.changed());
    }

    #[test]
    fn test_all_duplicates_leave_catalog_untouched() {
        let catalog = catalog_with(
            "2.9",
            vec![
                track_rule("A", "^(.+) - Remastered$"),
                track_rule("B", "^(.+) - Live$"),
            ],
        );
        let before = catalog.clone();
        let candidates = vec![
            track_rule("A renamed", "^(.+) - Live$"),
            track_rule("B renamed", "^(.+) - Remastered$"),
        ];

        let outcome = merge_rules(catalog, candidates).unwrap();

        assert_eq!(outcome.added_count, 0);
        assert!(outcome.added_names.is_empty());
        assert!(!outcome.changed());
        assert_eq!(outcome.catalog, before);
    }

    #[test]
    fn test_malformed_version_is_fatal() {
        let catalog = catalog_with("1", vec![]);
        let err = merge_rules(catalog, vec![track_rule("New", "^new$")]).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedVersion(ref v) if v == "1"));
    }

    #[test]
    fn test_minor_at_limit_is_rejected() {
        let catalog = catalog_with("1.18446744073709551615", vec![track_rule("Old", "^old$")]);
        let before = catalog.clone();

        let err = merge_rules(catalog, vec![track_rule("New", "^new$")]).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedVersion(ref v) if v == &before.version));
    }

    #[test]
    fn test_malformed_version_ignored_when_nothing_added() {
        let catalog = catalog_with("1", vec![track_rule("Old", "^old$")]);
        let outcome = merge_rules(catalog, vec![track_rule("Old copy", "^old$")]).unwrap();
        assert_eq!(outcome.added_count, 0);
        assert_eq!(outcome.catalog.version, "1");
    }

    #[test]
    fn test_same_new_key_twice_in_batch_is_appended_twice() {
        let catalog = catalog_with("1.0", vec![]);
        let candidates = vec![
            track_rule("First", "^(.+) - Mono$"),
            track_rule("Second", "^(.+) - Mono$"),
        ];

        let outcome = merge_rules(catalog, candidates).unwrap();

        assert_eq!(outcome.added_count, 2);
        assert_eq!(outcome.added_names, vec!["First", "Second"]);
        assert_eq!(outcome.catalog.version, "1.1");
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let catalog = catalog_with("1.2", vec![track_rule("A", "^a$")]);
        let candidates = vec![track_rule("B", "^b$"), track_rule("C", "^c$")];

        let first = merge_rules(catalog, candidates.clone()).unwrap();
        assert_eq!(first.added_count, 2);

        let second = merge_rules(first.catalog.clone(), candidates).unwrap();
        assert_eq!(second.added_count, 0);
        assert_eq!(second.catalog, first.catalog);
    }

    #[test]
    fn test_existing_rules_keep_order_and_content() {
        let original = vec![
            track_rule("A", "^a$"),
            album_rule("B", "^b$"),
            track_rule("C", "^c$"),
        ];
        let catalog = catalog_with("4.7", original.clone());

        let outcome = merge_rules(
            catalog,
            vec![track_rule("D", "^d$"), album_rule("E", "^e$")],
        )
        .unwrap();

        let rules = &outcome.catalog.rules;
        assert_eq!(&rules[..original.len()], &original[..]);
        let tail: Vec<_> = rules[original.len()..].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(tail, vec!["D", "E"]);
        assert_eq!(outcome.catalog.version, "4.8");
    }

    #[test]
    fn test_album_rules_are_not_prior_art() {
        let catalog = catalog_with(
            "1.0",
            vec![album_rule("Deluxe", "^(.+?) \\(Deluxe Remaster\\)$")],
        );

        let outcome = merge_rules(
            catalog,
            vec![album_rule("Deluxe again", "^(.+?) \\(Deluxe Remaster\\)$")],
        )
        .unwrap();

        assert_eq!(outcome.added_count, 1);
        assert_eq!(outcome.catalog.rules.len(), 2);
    }

    #[test]
    fn test_album_candidate_checked_against_track_keys() {
        let catalog = catalog_with("1.0", vec![track_rule("Shared", "^shared$")]);
        let outcome = merge_rules(catalog, vec![album_rule("Shared album", "^shared$")]).unwrap();
        assert_eq!(outcome.added_count, 0);
    }

    #[test]
    fn test_candidate_appended_unchanged() {
        let mut candidate = track_rule("Keep me", "^(.+) - Keep$")
            .with_description("kept as is")
            .with_examples(["Song - Keep → Song"]);
        candidate.requires_confirmation = true;
        candidate
            .extra
            .insert("requires_musicbrainz_confirmation".to_string(), true.into());

        let outcome = merge_rules(catalog_with("0.1", vec![]), vec![candidate.clone()]).unwrap();
        assert_eq!(outcome.catalog.rules, vec![candidate]);
    }

    #[test]
    fn test_other_target_rules_never_count_as_existing() {
        let mut artist_rule = Rule::new("Remove feat", RuleTarget::Other);
        artist_rule.extra.insert(
            "artist_name".to_string(),
            serde_json::json!({"find": "^new$", "replace": "$1"}),
        );
        let catalog = catalog_with("1.0", vec![artist_rule]);

        let outcome = merge_rules(
            catalog,
            vec![
                track_rule("New", "^new$"),
                Rule::new("No key", RuleTarget::Other),
            ],
        )
        .unwrap();

        assert_eq!(outcome.added_names, vec!["New"]);
        assert_eq!(outcome.catalog.rules.len(), 2);
        assert_eq!(outcome.catalog.version, "1.1");
    }

    #[test]
    fn test_description_template() {
        assert_eq!(
            updated_description(3),
            "Comprehensive set of rewrite rules to remove remaster information from track and album names, based on analysis of 600+ real Last.fm tracks. Updated with 3 additional patterns."
        );
    }
}
