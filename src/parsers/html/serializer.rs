use std::io;

use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

/// 序列化文档
///
/// 输出始终是 UTF-8，doctype、注释和原始的 script/style 内容原样保留。
pub fn serialize_document(dom: &RcDom) -> io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::html_to_dom;

    #[test]
    fn test_serialize_keeps_doctype_and_script() {
        let dom = html_to_dom(
            b"<!DOCTYPE html><html><head></head><body><script>if (a < b) {}</script><p>x &amp; y</p></body></html>",
        );

        let html = String::from_utf8(serialize_document(&dom).unwrap()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<script>if (a < b) {}</script>"));
        assert!(html.contains("<p>x &amp; y</p>"));
    }

    #[test]
    fn test_serialize_repairs_unclosed_tags() {
        let dom = html_to_dom(b"<div><p>open");
        let html = String::from_utf8(serialize_document(&dom).unwrap()).unwrap();

        assert!(html.contains("<div><p>open</p></div>"));
    }
}
