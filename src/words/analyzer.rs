//! 词频分析
//!
//! 按 Unicode 词字符切分文本，丢弃纯数字和单字符记号，区分大小写计数，
//! 然后按频率降序、大小写不敏感的字典序升序排名。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("static regex is valid"))
}

/// 单词及其出现次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordRecord {
    pub word: String,
    pub frequency: usize,
}

impl WordRecord {
    pub fn new(word: impl Into<String>, frequency: usize) -> Self {
        Self {
            word: word.into(),
            frequency,
        }
    }
}

/// 判断记号是否计入统计
///
/// 长度按 Unicode 码点计算，不是字节数。
pub fn is_countable(token: &str) -> bool {
    token.chars().count() >= 2 && !token.chars().all(char::is_numeric)
}

/// 切分文本
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| is_countable(token))
}

/// 统计各单词出现次数，区分大小写
pub fn count_words<S: AsRef<str>>(texts: &[S]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for token in tokenize(text.as_ref()) {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    counts
}

/// 排名比较：频率降序，再按小写形式升序，最后按原文升序保证确定性
fn rank_order(a: &WordRecord, b: &WordRecord) -> Ordering {
    b.frequency
        .cmp(&a.frequency)
        .then_with(|| a.word.to_lowercase().cmp(&b.word.to_lowercase()))
        .then_with(|| a.word.cmp(&b.word))
}

/// 分析文本，返回排好序的单词列表
pub fn analyze<S: AsRef<str>>(texts: &[S]) -> Vec<WordRecord> {
    let mut records: Vec<WordRecord> = count_words(texts)
        .into_iter()
        .map(|(word, frequency)| WordRecord { word, frequency })
        .collect();

    records.sort_by(rank_order);
    records
}
