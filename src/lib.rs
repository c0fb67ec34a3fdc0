//! # Wordswap Library
//!
//! 单站点的缓存式改写代理：抓取远程 HTML 并缓存，按管理员维护的词典替换可见文本中的单词，
//! 把链接和图片改写为继续经过代理。
//!
//! ## 模块组织
//!
//! - `core` - 错误类型、配置和请求处理流水线
//! - `storage` - 键值存储抽象（文件、内存）
//! - `network` - 抓取、页面缓存
//! - `parsers` - HTML 文档、可见文本、链接改写、客户端脚本
//! - `words` - 词频分析、替换词典、替换引擎
//! - `utils` - 目标地址处理
//! - `web` - Web服务器功能（可选）

pub mod core;
pub mod env;
pub mod network;
pub mod parsers;
pub mod storage;
pub mod utils;
#[cfg(feature = "web")]
pub mod web;
pub mod words;

// Re-export commonly used items for convenience
pub use crate::core::*;
pub use network::*;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use words::*;
