//! # 工具模块
//!
//! - `url` - 目标地址的解码、修复、校验和相对地址解析

pub mod url;

pub use url::{
    is_url_and_has_protocol, parse_path_target_url, parse_target_url, repair_collapsed_scheme,
    resolve_url, Url,
};
