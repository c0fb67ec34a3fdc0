//! # 单词处理模块
//!
//! - `analyzer` - 分词、计数与排序
//! - `dictionary` - 持久化的替换词典与排除集合
//! - `replacer` - 整词、区分大小写的级联替换
//! - `review` - 管理端审阅列表

pub mod analyzer;
pub mod dictionary;
pub mod replacer;
pub mod review;

pub use analyzer::{analyze, count_words, is_countable, tokenize, WordRecord};
pub use dictionary::{
    reconcile, Dictionary, ExclusionSet, ReconcileSummary, ReplacementMap, EXCLUSIONS_KEY,
    REPLACEMENTS_KEY,
};
pub use replacer::{apply_replacements, Replacer};
pub use review::{arrange, replace_field_name, word_id, ReviewRow, WordReview, REPLACE_FIELD_PREFIX};
