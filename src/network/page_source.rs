//! 页面来源：缓存优先，过期或缺失时抓取

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::core::ProxyError;
use crate::utils::url::parse_target_url;

use super::cache::CacheStore;
use super::session::Fetcher;

pub struct PageSource {
    cache: CacheStore,
    fetcher: Arc<dyn Fetcher>,
}

impl PageSource {
    pub fn new(cache: CacheStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// 校验原始地址后再解析；无效地址不会触碰缓存或网络
    pub fn resolve_target(&self, raw_url: &str) -> Result<Vec<u8>, ProxyError> {
        let url = parse_target_url(raw_url)?;
        self.resolve(&url)
    }

    /// 返回页面内容
    ///
    /// 抓取失败时不修改缓存，已有的过期条目保持原样。
    pub fn resolve(&self, url: &Url) -> Result<Vec<u8>, ProxyError> {
        if let Some(entry) = self.cache.get_fresh(url.as_str())? {
            debug!(url = %url, key = %entry.key, "cache hit");
            return Ok(entry.body);
        }

        debug!(url = %url, "cache miss");
        let body = self.fetcher.fetch(url)?;
        let entry = self.cache.put(url.as_str(), &body)?;
        info!(url = %url, bytes = entry.body.len(), "fetched and cached page");

        Ok(entry.body)
    }
}
