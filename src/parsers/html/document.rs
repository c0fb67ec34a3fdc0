//! 解析后的 HTML 文档
//!
//! `Document` 持有一次请求内的 DOM 树，请求结束即丢弃，从不持久化。

use markup5ever_rcdom::{Handle, RcDom};

use crate::core::ProxyError;

use super::dom::html_to_dom;
use super::metadata::get_base_url;
use super::serializer::serialize_document;
use super::utils::looks_like_binary;

pub struct Document {
    dom: RcDom,
}

impl Document {
    /// Parses raw bytes into a document.
    ///
    /// Markup defects never fail: html5ever recovers whatever structure it can.
    /// Only input that is clearly binary (image, archive, NUL bytes) is rejected
    /// with [`ProxyError::NotHtml`].
    pub fn parse(data: &[u8]) -> Result<Self, ProxyError> {
        if looks_like_binary(data) {
            return Err(ProxyError::NotHtml);
        }

        Ok(Self {
            dom: html_to_dom(data),
        })
    }

    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    pub fn root(&self) -> &Handle {
        &self.dom.document
    }

    pub fn body(&self) -> Option<Handle> {
        self.body_with_path().map(|(body, _)| body)
    }

    /// `<body>` 及其从根节点出发的子节点下标路径
    pub(crate) fn body_with_path(&self) -> Option<(Handle, Vec<usize>)> {
        let root = self.root();
        let html_index = root.children.borrow().iter().position(|child| {
            super::dom::get_node_name(child) == Some("html")
        })?;
        let html = root.children.borrow()[html_index].clone();

        let body_index = html
            .children
            .borrow()
            .iter()
            .position(|child| super::dom::get_node_name(child) == Some("body"))?;
        let body = html.children.borrow()[body_index].clone();

        Some((body, vec![html_index, body_index]))
    }

    /// `<base href>` 的值（如果有）
    pub fn base_href(&self) -> Option<String> {
        get_base_url(self.root())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ProxyError> {
        serialize_document(&self.dom).map_err(ProxyError::Serialize)
    }
}
