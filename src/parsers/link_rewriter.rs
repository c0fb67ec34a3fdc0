//! 链接重写模块
//!
//! 负责重写HTML中的锚点链接，使后续导航继续经过代理入口

use markup5ever_rcdom::{Handle, NodeData};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::parsers::html::{get_node_attr, set_node_attr, Document};
use crate::utils::url::{is_url_and_has_protocol, resolve_url, Url};

/// Define the percent-encoding set for URLs - encode everything except unreserved characters
const URL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ').add(b'"').add(b'<').add(b'>').add(b'`')
    .add(b':').add(b'/').add(b'?').add(b'#').add(b'[').add(b']').add(b'@')
    .add(b'!').add(b'$').add(b'&').add(b'\'').add(b'(').add(b')')
    .add(b'*').add(b'+').add(b',').add(b';').add(b'=').add(b'%')
    .add(b'{').add(b'}').add(b'|').add(b'\\').add(b'^');

/// 构造经过代理的地址：`<proxy_entry>?url=<编码后的目标地址>`
pub fn proxy_link(proxy_entry: &str, target: &Url) -> String {
    format!(
        "{}?url={}",
        proxy_entry,
        utf8_percent_encode(target.as_str(), URL_ENCODE_SET)
    )
}

/// 计算文档中相对链接的解析基准
///
/// 存在 `<base href>` 时以它（相对页面地址解析后）为准，否则使用页面地址。
pub fn document_base_url(document: &Document, page_url: &Url) -> Url {
    document
        .base_href()
        .and_then(|href| resolve_url(page_url, &href))
        .unwrap_or_else(|| page_url.clone())
}

/// 重写文档中所有锚点链接
///
/// # Arguments
///
/// * `document` - 已解析的文档
/// * `page_url` - 文档原始地址
/// * `proxy_entry` - 代理入口，例如 `/proxy`
///
/// # Returns
///
/// 被重写的链接数量
pub fn rewrite_links(document: &mut Document, page_url: &Url, proxy_entry: &str) -> usize {
    let base_url = document_base_url(document, page_url);
    let mut rewritten = 0;

    walk_and_rewrite_links(document.root(), &base_url, proxy_entry, &mut rewritten);

    tracing::debug!("重写了 {} 个链接: {}", rewritten, page_url);
    rewritten
}

/// 递归遍历DOM树并重写链接
fn walk_and_rewrite_links(node: &Handle, base_url: &Url, proxy_entry: &str, rewritten: &mut usize) {
    match node.data {
        NodeData::Document => {
            for child_node in node.children.borrow().iter() {
                walk_and_rewrite_links(child_node, base_url, proxy_entry, rewritten);
            }
        }
        NodeData::Element { ref name, .. } => {
            if name.local.as_ref() == "a" && rewrite_anchor_link(node, base_url, proxy_entry) {
                *rewritten += 1;
            }

            for child_node in node.children.borrow().iter() {
                walk_and_rewrite_links(child_node, base_url, proxy_entry, rewritten);
            }
        }
        _ => {}
    }
}

/// 重写锚点链接的href属性
fn rewrite_anchor_link(node: &Handle, base_url: &Url, proxy_entry: &str) -> bool {
    let Some(href_value) = get_node_attr(node, "href") else {
        return false;
    };
    let trimmed_href = href_value.trim();

    if should_skip_link(trimmed_href) {
        return false;
    }

    match rewrite_url(trimmed_href, base_url, proxy_entry) {
        Some(rewritten_href) => {
            set_node_attr(node, "href", Some(rewritten_href));
            true
        }
        None => false,
    }
}

/// 判断是否应该跳过重写的链接
fn should_skip_link(href: &str) -> bool {
    let lowered = href.to_ascii_lowercase();

    // 空链接、页内锚点和各类非导航协议保持原样
    href.is_empty()
        || href.starts_with('#')
        || lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
        || lowered.starts_with("blob:")
}

/// 重写单个URL
///
/// 无法解析或非 http(s) 的地址返回 `None`，原属性保持不变。
fn rewrite_url(url: &str, base_url: &Url, proxy_entry: &str) -> Option<String> {
    let absolute_url = resolve_url(base_url, url).filter(is_url_and_has_protocol)?;
    Some(proxy_link(proxy_entry, &absolute_url))
}
