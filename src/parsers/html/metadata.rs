//! HTML 文档元数据
//!
//! 读取 `<base>`，它决定相对链接的解析基准。

use markup5ever_rcdom::Handle;

use super::dom::{find_nodes, get_node_attr};

/// 获取文档的 base URL
///
/// 根据 HTML 规范，只有第一个 `<base>` 标签有效，其余的将被忽略。
pub fn get_base_url(handle: &Handle) -> Option<String> {
    find_nodes(handle, &["html", "head", "base"])
        .first()
        .and_then(|base_node| get_node_attr(base_node, "href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}
