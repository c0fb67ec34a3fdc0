//! HTML解析和处理模块
//!
//! - `utils`: 常量和二进制内容检测
//! - `dom`: 基础DOM操作
//! - `document`: 单次请求内的文档对象
//! - `metadata`: `<base>`、`<title>` 等元数据
//! - `serializer`: 序列化功能
//! - `text_nodes`: 可见文本节点的选择、提取和改写

pub mod assets;
pub mod document;
pub mod dom;
pub mod metadata;
pub mod serializer;
pub mod text_nodes;
pub mod utils;

pub use assets::{replace_images, strip_blocked_elements};
pub use document::Document;
pub use dom::{
    append_child, find_nodes, get_node_attr, get_node_name, has_all_classes,
    html_to_dom, new_element, new_text_node, prepend_child, set_node_attr,
};
pub use metadata::get_base_url;
pub use serializer::serialize_document;
pub use text_nodes::{body_text_nodes, extract_visible_text, rewrite_text_nodes, TextNode};
pub use utils::{is_non_visible_element, looks_like_binary, WHITESPACES};
