//! 替换词典与排除集合
//!
//! 两者都以便于 diff 的 JSON 文件保存在存储中：
//! - `word_replacements.json`：`{"原词": "替换词", ...}`，保留插入顺序
//! - `word_exclusions.json`：排序后的字符串数组
//!
//! 每次请求都重新读取，不在进程内缓存。所有修改都是存储层的一次加锁读-改-写。

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::storage::{Storage, StorageError, StorageResult};

pub const REPLACEMENTS_KEY: &str = "word_replacements.json";
pub const EXCLUSIONS_KEY: &str = "word_exclusions.json";

/// 有序的 `原词 → 替换词` 映射
///
/// 键唯一且区分大小写；替换词为空或与原词相同的记录不会被保存。
/// 迭代顺序即插入顺序，替换引擎按此顺序依次应用规则。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: Vec<(String, String)>,
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(from, _)| from == word)
            .map(|(_, to)| to.as_str())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// 设置映射；已存在的键原位覆盖，新键追加到末尾
    ///
    /// 替换词为空或等于原词时等同于 [`ReplacementMap::remove`]。返回映射是否发生变化。
    pub fn set(&mut self, word: &str, replacement: &str) -> bool {
        if replacement.is_empty() || replacement == word {
            return self.remove(word);
        }

        match self.entries.iter_mut().find(|(from, _)| from == word) {
            Some((_, to)) if to == replacement => false,
            Some((_, to)) => {
                *to = replacement.to_string();
                true
            }
            None => {
                self.entries.push((word.to_string(), replacement.to_string()));
                true
            }
        }
    }

    pub fn remove(&mut self, word: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(from, _)| from != word);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ReplacementMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut map = ReplacementMap::new();
        for (from, to) in iter {
            map.set(from, to);
        }
        map
    }
}

impl Serialize for ReplacementMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (from, to) in &self.entries {
            map.serialize_entry(from, to)?;
        }
        map.end()
    }
}

struct ReplacementMapVisitor;

impl<'de> Visitor<'de> for ReplacementMapVisitor {
    type Value = ReplacementMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object of word replacements")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = ReplacementMap::new();
        while let Some((from, to)) = access.next_entry::<String, String>()? {
            map.set(&from, &to);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for ReplacementMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ReplacementMapVisitor)
    }
}

/// 在管理列表中隐藏的单词
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet {
    words: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn insert(&mut self, word: &str) -> bool {
        self.words.insert(word.to_string())
    }

    pub fn remove(&mut self, word: &str) -> bool {
        self.words.remove(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

/// 批量保存的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub set: usize,
    pub removed: usize,
}

/// 以候选单词列表为准对映射做完整对账
///
/// 对每个候选单词：提供了非空且不同于原词的替换词则设置或覆盖，否则删除已有映射。
/// 不在候选列表中的单词保持不变。
pub fn reconcile<S: AsRef<str>>(
    map: &mut ReplacementMap,
    candidates: &[S],
    proposals: &HashMap<String, String>,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for word in candidates {
        let word = word.as_ref();
        let proposed = proposals.get(word).map(|s| s.trim()).unwrap_or("");

        if !proposed.is_empty() && proposed != word {
            if map.set(word, proposed) {
                summary.set += 1;
            }
        } else if map.remove(word) {
            summary.removed += 1;
        }
    }

    summary
}

fn decode<T: for<'de> Deserialize<'de> + Default>(key: &str, data: Option<Vec<u8>>) -> StorageResult<T> {
    match data {
        None => Ok(T::default()),
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Some(bytes) => {
            serde_json::from_slice(&bytes).map_err(|e| StorageError::serialization(key, e))
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> StorageResult<Vec<u8>> {
    let mut data = serde_json::to_vec_pretty(value).map_err(|e| StorageError::serialization(key, e))?;
    data.push(b'\n');
    Ok(data)
}

/// 词典文件的读写入口
#[derive(Clone)]
pub struct Dictionary {
    storage: Arc<dyn Storage>,
}

impl Dictionary {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> StorageResult<ReplacementMap> {
        decode(REPLACEMENTS_KEY, self.storage.read(REPLACEMENTS_KEY)?)
    }

    pub fn save(&self, map: &ReplacementMap) -> StorageResult<()> {
        self.storage.write(REPLACEMENTS_KEY, &encode(REPLACEMENTS_KEY, map)?)
    }

    pub fn load_exclusions(&self) -> StorageResult<ExclusionSet> {
        decode(EXCLUSIONS_KEY, self.storage.read(EXCLUSIONS_KEY)?)
    }

    pub fn save_exclusions(&self, exclusions: &ExclusionSet) -> StorageResult<()> {
        self.storage.write(EXCLUSIONS_KEY, &encode(EXCLUSIONS_KEY, exclusions)?)
    }

    /// 在替换文件的锁内对账并写回
    ///
    /// 现有文件无法解析时直接失败，不会用空映射覆盖它。
    pub fn save_reconciled<S: AsRef<str>>(
        &self,
        candidates: &[S],
        proposals: &HashMap<String, String>,
    ) -> StorageResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        self.storage.update(REPLACEMENTS_KEY, &mut |current| {
            let mut map: ReplacementMap = decode(REPLACEMENTS_KEY, current)?;
            summary = reconcile(&mut map, candidates, proposals);
            encode(REPLACEMENTS_KEY, &map)
        })?;

        Ok(summary)
    }

    /// 加入排除集合并立即保存；返回集合是否变化
    pub fn exclude(&self, word: &str) -> StorageResult<bool> {
        self.modify_exclusions(|set| set.insert(word))
    }

    /// 从排除集合移除并立即保存；返回集合是否变化
    pub fn unexclude(&self, word: &str) -> StorageResult<bool> {
        self.modify_exclusions(|set| set.remove(word))
    }

    fn modify_exclusions<F>(&self, mut f: F) -> StorageResult<bool>
    where
        F: FnMut(&mut ExclusionSet) -> bool,
    {
        let mut changed = false;

        self.storage.update(EXCLUSIONS_KEY, &mut |current| {
            let mut set: ExclusionSet = decode(EXCLUSIONS_KEY, current)?;
            changed = f(&mut set);
            encode(EXCLUSIONS_KEY, &set)
        })?;

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn proposals(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_set_rejects_self_mapping_and_empty() {
        let mut map = ReplacementMap::new();

        assert!(!map.set("cat", "cat"));
        assert!(!map.set("cat", ""));
        assert!(map.is_empty());

        assert!(map.set("cat", "dog"));
        assert!(!map.set("cat", "dog"));
        assert!(map.set("cat", "cat"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_set_keeps_insertion_order() {
        let mut map = ReplacementMap::new();
        map.set("b", "1");
        map.set("a", "2");
        map.set("b", "3");

        let pairs: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(pairs, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let map: ReplacementMap = [("zebra", "horse"), ("apple", "pear")].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zebra":"horse","apple":"pear"}"#);

        let back: ReplacementMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_deserialize_drops_invalid_records() {
        let map: ReplacementMap =
            serde_json::from_str(r#"{"same":"same","empty":"","ok":"fine"}"#).unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("ok", "fine")]);
    }

    #[test]
    fn test_exclusions_serialize_sorted() {
        let set: ExclusionSet = ["zeta", "Alpha", "beta"].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["Alpha","beta","zeta"]"#
        );
    }

    #[test]
    fn test_reconcile_sets_overwrites_and_deletes() {
        let mut map: ReplacementMap = [("old", "gone"), ("keep", "kept"), ("cat", "kitten")]
            .into_iter()
            .collect();

        let summary = reconcile(
            &mut map,
            &["cat", "old", "new", "same"],
            &proposals(&[("cat", " dog "), ("new", "fresh"), ("same", "same")]),
        );

        assert_eq!(summary, ReconcileSummary { set: 2, removed: 1 });
        assert_eq!(map.get("cat"), Some("dog"));
        assert_eq!(map.get("new"), Some("fresh"));
        assert_eq!(map.get("old"), None);
        assert_eq!(map.get("same"), None);
        // 不在候选列表中
        assert_eq!(map.get("keep"), Some("kept"));
    }

    #[test]
    fn test_save_reconciled_is_idempotent() {
        let dictionary = Dictionary::new(Arc::new(MemoryStorage::new()));
        let words = ["cat", "dog"];
        let batch = proposals(&[("cat", "tiger"), ("dog", "wolf")]);

        dictionary.save_reconciled(&words, &batch).unwrap();
        let first = dictionary.load().unwrap();

        let summary = dictionary.save_reconciled(&words, &batch).unwrap();
        let second = dictionary.load().unwrap();

        assert_eq!(first, second);
        assert_eq!(summary, ReconcileSummary::default());
    }

    #[test]
    fn test_save_reconciled_empty_replacement_deletes() {
        let dictionary = Dictionary::new(Arc::new(MemoryStorage::new()));
        dictionary
            .save_reconciled(&["cat"], &proposals(&[("cat", "tiger")]))
            .unwrap();

        dictionary
            .save_reconciled(&["cat"], &proposals(&[("cat", "")]))
            .unwrap();

        assert!(dictionary.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_reconciled_refuses_corrupt_file() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(REPLACEMENTS_KEY, b"{not json").unwrap();
        let dictionary = Dictionary::new(storage.clone());

        let result = dictionary.save_reconciled(&["cat"], &proposals(&[("cat", "dog")]));

        assert!(matches!(result, Err(StorageError::Serialization { .. })));
        assert_eq!(
            storage.read(REPLACEMENTS_KEY).unwrap(),
            Some(b"{not json".to_vec())
        );
    }

    #[test]
    fn test_exclude_and_unexclude() {
        let dictionary = Dictionary::new(Arc::new(MemoryStorage::new()));

        assert!(dictionary.exclude("the").unwrap());
        assert!(!dictionary.exclude("the").unwrap());
        assert!(dictionary.load_exclusions().unwrap().contains("the"));

        assert!(dictionary.unexclude("the").unwrap());
        assert!(!dictionary.unexclude("the").unwrap());
        assert!(dictionary.load_exclusions().unwrap().is_empty());
    }

    #[test]
    fn test_exclusions_do_not_touch_replacements() {
        let dictionary = Dictionary::new(Arc::new(MemoryStorage::new()));
        dictionary
            .save(&[("cat", "dog")].into_iter().collect())
            .unwrap();

        dictionary.exclude("cat").unwrap();

        assert_eq!(dictionary.load().unwrap().get("cat"), Some("dog"));
    }

    #[test]
    fn test_missing_and_blank_files_load_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let dictionary = Dictionary::new(storage.clone());
        assert!(dictionary.load().unwrap().is_empty());

        storage.write(EXCLUSIONS_KEY, b"  \n").unwrap();
        assert!(dictionary.load_exclusions().unwrap().is_empty());
    }
}
