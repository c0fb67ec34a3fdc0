//! 可见文本节点
//!
//! 选择规则：`<body>` 的后代文本节点，不在 `script`、`style`、`noscript` 内，
//! 且去掉首尾 ASCII 空白后非空。读取（提取文本）和写入（替换文本）使用同一规则。

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};

use super::document::Document;
use super::utils::{is_non_visible_element, WHITESPACES};

/// 文档中的一个可见文本节点
///
/// `path` 是从文档根节点出发、逐层的子节点下标，在同一棵树内稳定。
#[derive(Debug, Clone)]
pub struct TextNode {
    path: Vec<usize>,
    handle: Handle,
}

impl TextNode {
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// 节点的原始内容（未去空白）
    pub fn text(&self) -> String {
        match self.handle.data {
            NodeData::Text { ref contents } => contents.borrow().to_string(),
            _ => String::new(),
        }
    }

    pub fn set_text(&self, text: &str) {
        if let NodeData::Text { ref contents } = self.handle.data {
            *contents.borrow_mut() = StrTendril::from_slice(text);
        }
    }
}

/// 按文档顺序收集 `<body>` 下所有可见文本节点
pub fn body_text_nodes(document: &Document) -> Vec<TextNode> {
    let mut nodes = Vec::new();

    if let Some((body, mut path)) = document.body_with_path() {
        collect_text_nodes(&body, &mut path, &mut nodes);
    }

    nodes
}

fn collect_text_nodes(node: &Handle, path: &mut Vec<usize>, out: &mut Vec<TextNode>) {
    for (index, child) in node.children.borrow().iter().enumerate() {
        path.push(index);

        match child.data {
            NodeData::Text { ref contents } => {
                if !contents.borrow().trim_matches(WHITESPACES).is_empty() {
                    out.push(TextNode {
                        path: path.clone(),
                        handle: child.clone(),
                    });
                }
            }
            NodeData::Element { ref name, .. } => {
                if !is_non_visible_element(&name.local) {
                    collect_text_nodes(child, path, out);
                }
            }
            _ => {}
        }

        path.pop();
    }
}

/// 提取可见文本，每个节点一项，已去除首尾空白
pub fn extract_visible_text(document: &Document) -> Vec<String> {
    body_text_nodes(document)
        .iter()
        .map(|node| node.text().trim_matches(WHITESPACES).to_string())
        .collect()
}

/// 对每个可见文本节点的原始内容应用 `f`，原地替换
///
/// 结果与原内容相同的节点保持不动。返回被修改的节点数。
pub fn rewrite_text_nodes<F>(document: &mut Document, mut f: F) -> usize
where
    F: FnMut(&str) -> String,
{
    let mut changed = 0;

    for node in body_text_nodes(document) {
        let original = node.text();
        let rewritten = f(&original);

        if rewritten != original {
            node.set_text(&rewritten);
            changed += 1;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Document {
        Document::parse(html.as_bytes()).unwrap()
    }

    #[test]
    fn test_script_text_is_excluded() {
        let document = parse("<body><script>var hidden = 1;</script><p>Visible</p></body>");
        assert_eq!(extract_visible_text(&document), vec!["Visible"]);
    }

    #[test]
    fn test_style_noscript_and_head_are_excluded() {
        let document = parse(
            "<html><head><title>Title</title><style>p{}</style></head>\
             <body><style>.a{}</style><noscript>Enable JS</noscript>\
             <div>One <b>Two</b></div>   <!-- comment --> Three</body></html>",
        );

        assert_eq!(extract_visible_text(&document), vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_blank_nodes_are_dropped_and_text_trimmed() {
        let document = parse("<body>\n  <p>  padded\t</p>\n  <p> </p></body>");
        assert_eq!(extract_visible_text(&document), vec!["padded"]);
    }

    #[test]
    fn test_nested_script_inside_element_is_excluded() {
        let document = parse("<body><div><span>keep</span><script>drop()</script></div></body>");
        assert_eq!(extract_visible_text(&document), vec!["keep"]);
    }

    #[test]
    fn test_paths_are_stable() {
        let document = parse("<html><head></head><body><p>a</p><div><i>b</i></div></body></html>");
        let paths: Vec<Vec<usize>> = body_text_nodes(&document)
            .iter()
            .map(|node| node.path().to_vec())
            .collect();

        assert_eq!(paths, vec![vec![0, 1, 0, 0], vec![0, 1, 1, 0, 0]]);

        let again: Vec<Vec<usize>> = body_text_nodes(&document)
            .iter()
            .map(|node| node.path().to_vec())
            .collect();
        assert_eq!(paths, again);
    }

    #[test]
    fn test_rewrite_receives_raw_content() {
        let mut document = parse("<body><p> cat </p><script>cat</script></body>");
        let mut seen = Vec::new();

        let changed = rewrite_text_nodes(&mut document, |text| {
            seen.push(text.to_string());
            text.replace("cat", "dog")
        });

        assert_eq!(seen, vec![" cat "]);
        assert_eq!(changed, 1);

        let html = String::from_utf8(document.serialize().unwrap()).unwrap();
        assert!(html.contains("<p> dog </p>"));
        assert!(html.contains("<script>cat</script>"));
    }

    #[test]
    fn test_rewrite_leaves_unmatched_nodes() {
        let mut document = parse("<body><p>nothing here</p></body>");
        let changed = rewrite_text_nodes(&mut document, |text| text.to_string());

        assert_eq!(changed, 0);
        assert_eq!(extract_visible_text(&document), vec!["nothing here"]);
    }

    #[test]
    fn test_text_is_escaped_on_serialize() {
        let mut document = parse("<body><p>x</p></body>");
        rewrite_text_nodes(&mut document, |_| "<b>&</b>".to_string());

        let html = String::from_utf8(document.serialize().unwrap()).unwrap();
        assert!(html.contains("<p>&lt;b&gt;&amp;&lt;/b&gt;</p>"));
    }
}
