//! # 解析器模块
//!
//! - `html` - HTML文档解析、可见文本节点、DOM操作、元数据
//! - `link_rewriter` - 链接重写，将锚点链接转换为代理链接
//! - `client_script` - 注入的客户端脚本和横幅

pub mod client_script;
pub mod html;
pub mod link_rewriter;

// Re-export commonly used items for convenience
pub use client_script::{
    inject_banner, inject_client_script, render_client_script, ClientScriptConfig,
    CLIENT_SCRIPT_VERSION,
};
pub use html::{
    body_text_nodes, extract_visible_text, rewrite_text_nodes, Document, TextNode,
};
pub use link_rewriter::{document_base_url, proxy_link, rewrite_links};
