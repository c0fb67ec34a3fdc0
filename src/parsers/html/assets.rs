//! HTML 静态资源处理
//!
//! 服务端对已有标记预先执行客户端脚本的两条规则：
//! - 按 class 签名把图片替换为占位图
//! - 删除引用被屏蔽广告域名的元素
//!
//! 动态加入的内容仍由注入的客户端脚本处理。

use markup5ever_rcdom::{Handle, NodeData};

use super::document::Document;
use super::dom::{get_node_attr, has_all_classes, set_node_attr};

/// 引用外部地址的属性
const REFERENCE_ATTRS: &[&str] = &["src", "href"];

/// 将带有全部 `classes` 的 `<img>` 替换为占位图
///
/// 同时移除 `srcset`，避免浏览器继续加载原图。返回被替换的图片数量。
pub fn replace_images(document: &mut Document, classes: &[&str], placeholder: &str) -> usize {
    if classes.is_empty() {
        return 0;
    }

    let mut replaced = 0;
    for image in super::dom::find_nodes(document.root(), &["img"]) {
        if has_all_classes(&image, classes) {
            set_node_attr(&image, "src", Some(placeholder.to_string()));
            set_node_attr(&image, "srcset", None);
            replaced += 1;
        }
    }

    replaced
}

/// 删除 `src`/`href` 中包含 `domain` 的元素（连同其子树）
///
/// 返回被删除的元素数量。
pub fn strip_blocked_elements(document: &mut Document, domain: &str) -> usize {
    if domain.is_empty() {
        return 0;
    }

    strip_from(document.root(), domain)
}

fn references_domain(node: &Handle, domain: &str) -> bool {
    REFERENCE_ATTRS
        .iter()
        .filter_map(|attr| get_node_attr(node, attr))
        .any(|value| value.contains(domain))
}

fn strip_from(node: &Handle, domain: &str) -> usize {
    let mut removed = 0;

    node.children.borrow_mut().retain(|child| {
        let blocked = matches!(child.data, NodeData::Element { .. }) && references_domain(child, domain);
        if blocked {
            removed += 1;
        }
        !blocked
    });

    let children: Vec<Handle> = node.children.borrow().clone();
    for child in children.iter() {
        removed += strip_from(child, domain);
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Document {
        Document::parse(html.as_bytes()).unwrap()
    }

    fn serialize(document: &Document) -> String {
        String::from_utf8(document.serialize().unwrap()).unwrap()
    }

    #[test]
    fn test_replace_images_by_class_signature() {
        let mut document = parse(
            "<body><img class=\"w-100 h-auto\" src=\"/a.jpg\" srcset=\"/a2.jpg 2x\">\
             <img class=\"w-100\" src=\"/b.jpg\"></body>",
        );

        let replaced = replace_images(&mut document, &["w-100", "h-auto"], "/static/placeholder.jpg");
        let html = serialize(&document);

        assert_eq!(replaced, 1);
        assert!(html.contains("<img class=\"w-100 h-auto\" src=\"/static/placeholder.jpg\">"));
        assert!(html.contains("src=\"/b.jpg\""));
    }

    #[test]
    fn test_replace_images_without_signature_is_noop() {
        let mut document = parse("<body><img class=\"w-100\" src=\"/b.jpg\"></body>");
        assert_eq!(replace_images(&mut document, &[], "/p.jpg"), 0);
    }

    #[test]
    fn test_strip_blocked_elements() {
        let mut document = parse(
            "<body><p>keep</p>\
             <a href=\"https://ib.adnxs.com/click\"><img src=\"/x.png\"></a>\
             <div><iframe src=\"https://acdn.adnxs.com/frame\"></iframe><span>also keep</span></div>\
             <script src=\"https://adnxs.com/ast.js\"></script></body>",
        );

        let removed = strip_blocked_elements(&mut document, "adnxs.com");
        let html = serialize(&document);

        assert_eq!(removed, 3);
        assert!(!html.contains("adnxs.com"));
        assert!(!html.contains("/x.png"));
        assert!(html.contains("<p>keep</p>"));
        assert!(html.contains("<span>also keep</span>"));
    }
}
