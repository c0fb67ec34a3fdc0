//! # 网络模块
//!
//! 页面获取与缓存：
//!
//! - `session` - 出站 HTTP 请求
//! - `cache` - 带新鲜期的页面缓存
//! - `page_source` - 组合两者：缓存新鲜则直接返回，否则抓取并写入缓存

pub mod cache;
pub mod page_source;
pub mod session;

pub use cache::{cache_key, CacheEntry, CacheMeta, CacheStats, CacheStore, Clock, SystemClock};
pub use page_source::PageSource;
pub use session::{Fetcher, HttpFetcher};
