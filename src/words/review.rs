//! 管理端单词审阅列表

use serde::Serialize;

use super::analyzer::WordRecord;
use super::dictionary::{ExclusionSet, ReplacementMap};

/// 表单字段名前缀：`replace_<id>`
pub const REPLACE_FIELD_PREFIX: &str = "replace_";

/// 单词在表单中的不透明标识
///
/// 单词本身可能含有任意 Unicode 字符，不适合直接作为字段名。
pub fn word_id(word: &str) -> String {
    let hash = blake3::hash(word.as_bytes()).to_hex();
    hash.as_str()[..32].to_string()
}

pub fn replace_field_name(word: &str) -> String {
    format!("{}{}", REPLACE_FIELD_PREFIX, word_id(word))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub word: String,
    pub frequency: usize,
    pub id: String,
    pub replacement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordReview {
    pub url: String,
    pub words: Vec<ReviewRow>,
}

impl WordReview {
    /// 候选单词列表，保存时按此列表对账
    pub fn candidates(&self) -> Vec<&str> {
        self.words.iter().map(|row| row.word.as_str()).collect()
    }
}

/// 去掉排除的单词，并把已有替换的单词移到末尾（各自保持原有顺序）
pub fn arrange(
    ranked: Vec<WordRecord>,
    exclusions: &ExclusionSet,
    replacements: &ReplacementMap,
) -> Vec<ReviewRow> {
    let (replaced, pending): (Vec<_>, Vec<_>) = ranked
        .into_iter()
        .filter(|record| !exclusions.contains(&record.word))
        .partition(|record| replacements.contains(&record.word));

    pending
        .into_iter()
        .chain(replaced)
        .map(|record| ReviewRow {
            id: word_id(&record.word),
            replacement: replacements.get(&record.word).map(str::to_string),
            word: record.word,
            frequency: record.frequency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(words: &[(&str, usize)]) -> Vec<WordRecord> {
        words
            .iter()
            .map(|(word, frequency)| WordRecord::new(*word, *frequency))
            .collect()
    }

    #[test]
    fn test_word_id_is_stable_and_opaque() {
        assert_eq!(word_id("café"), word_id("café"));
        assert_ne!(word_id("Cat"), word_id("cat"));
        assert_eq!(word_id("café").len(), 32);
        assert!(word_id("café").chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_arrange_filters_and_partitions() {
        let ranked = records(&[("the", 9), ("cat", 5), ("dog", 4), ("bird", 3), ("fish", 2)]);
        let exclusions: ExclusionSet = ["the"].into_iter().collect();
        let replacements: ReplacementMap = [("cat", "tiger"), ("bird", "eagle")].into_iter().collect();

        let rows = arrange(ranked, &exclusions, &replacements);
        let words: Vec<&str> = rows.iter().map(|row| row.word.as_str()).collect();

        assert_eq!(words, vec!["dog", "fish", "cat", "bird"]);
        assert_eq!(rows[2].replacement.as_deref(), Some("tiger"));
        assert_eq!(rows[0].replacement, None);
        assert_eq!(rows[0].frequency, 4);
    }

    #[test]
    fn test_excluded_replaced_word_is_hidden() {
        let ranked = records(&[("cat", 5)]);
        let exclusions: ExclusionSet = ["cat"].into_iter().collect();
        let replacements: ReplacementMap = [("cat", "tiger")].into_iter().collect();

        assert!(arrange(ranked, &exclusions, &replacements).is_empty());
    }
}
