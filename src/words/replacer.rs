//! 整词替换引擎

use regex::{NoExpand, Regex};
use tracing::debug;

use crate::parsers::html::{rewrite_text_nodes, Document};

use super::dictionary::ReplacementMap;

/// 编译好的替换规则，顺序与词典迭代顺序一致
///
/// 规则逐条作用在同一段文本上：前一条规则的输出可以被后一条规则再次匹配（级联替换）。
/// `{"a": "b", "b": "c"}` 作用于 `"a"` 的结果是 `"c"`。
pub struct Replacer {
    rules: Vec<(Regex, String)>,
}

impl Replacer {
    pub fn new(map: &ReplacementMap) -> Self {
        let rules = map
            .iter()
            .filter_map(|(from, to)| {
                // 转义后的字面量总能编译，失败只可能来自体积限制
                Regex::new(&format!(r"\b{}\b", regex::escape(from)))
                    .ok()
                    .map(|re| (re, to.to_string()))
            })
            .collect();

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn replace(&self, text: &str) -> String {
        let mut current = text.to_string();

        for (pattern, replacement) in &self.rules {
            if pattern.is_match(&current) {
                current = pattern
                    .replace_all(&current, NoExpand(replacement))
                    .into_owned();
            }
        }

        current
    }
}

/// 将替换词典应用到文档所有可见文本节点
///
/// 词典为空时直接返回，不触碰文档。返回被修改的文本节点数。
pub fn apply_replacements(document: &mut Document, map: &ReplacementMap) -> usize {
    if map.is_empty() {
        return 0;
    }

    let replacer = Replacer::new(map);
    let changed = rewrite_text_nodes(document, |text| replacer.replace(text));
    debug!(rules = map.len(), changed, "applied word replacements");
    changed
}
