//! 页面缓存
//!
//! 每个条目占两个存储键：
//! - `<hash>.html` - 原始响应体
//! - `<hash>.json` - 元数据 `{url, fetched_at}`
//!
//! 先写响应体、最后写元数据，所以元数据存在即代表条目完整。元数据缺失或损坏视为未命中。
//! 条目从不自动清理，只能通过 [`CacheStore::purge_stale`] 显式清理。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{Storage, StorageError, StorageResult};

const BODY_SUFFIX: &str = ".html";
const META_SUFFIX: &str = ".json";

/// 时间来源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 缓存元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}

/// 一个完整的缓存条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
    pub stale: usize,
    pub total_bytes: u64,
}

/// 缓存键：URL 原文（含查询串）的 blake3 十六进制摘要
pub fn cache_key(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex().to_string()
}

pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self::with_clock(storage, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn Storage>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            ttl,
        }
    }

    /// `now - fetched_at < ttl`
    pub fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        let age = self.clock.now().signed_duration_since(fetched_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            // 超出 chrono 可表示范围的 TTL 视为永不过期
            Err(_) => true,
        }
    }

    /// 读取条目（不论新鲜与否）
    pub fn get(&self, url: &str) -> StorageResult<Option<CacheEntry>> {
        let key = cache_key(url);

        let meta = match self.read_meta(&key)? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        if meta.url != url {
            warn!(key = %key, "cache metadata belongs to a different url");
            return Ok(None);
        }

        match self.storage.read(&format!("{}{}", key, BODY_SUFFIX))? {
            Some(body) => Ok(Some(CacheEntry {
                key,
                body,
                fetched_at: meta.fetched_at,
            })),
            None => {
                warn!(key = %key, "cache metadata without body");
                Ok(None)
            }
        }
    }

    /// 只返回新鲜的条目
    pub fn get_fresh(&self, url: &str) -> StorageResult<Option<CacheEntry>> {
        Ok(self.get(url)?.filter(|entry| self.is_fresh(entry.fetched_at)))
    }

    /// 以当前时间写入条目，覆盖旧条目
    pub fn put(&self, url: &str, body: &[u8]) -> StorageResult<CacheEntry> {
        let key = cache_key(url);
        let meta = CacheMeta {
            url: url.to_string(),
            fetched_at: self.clock.now(),
        };
        let meta_key = format!("{}{}", key, META_SUFFIX);
        let meta_bytes =
            serde_json::to_vec(&meta).map_err(|e| StorageError::serialization(&meta_key, e))?;

        self.storage.write(&format!("{}{}", key, BODY_SUFFIX), body)?;
        self.storage.write(&meta_key, &meta_bytes)?;
        debug!(key = %key, bytes = body.len(), "stored cache entry");

        Ok(CacheEntry {
            key,
            body: body.to_vec(),
            fetched_at: meta.fetched_at,
        })
    }

    pub fn stats(&self) -> StorageResult<CacheStats> {
        let mut stats = CacheStats::default();

        for (key, meta) in self.entries()? {
            stats.entries += 1;
            if self.is_fresh(meta.fetched_at) {
                stats.fresh += 1;
            } else {
                stats.stale += 1;
            }
            if let Some(body) = self.storage.read(&format!("{}{}", key, BODY_SUFFIX))? {
                stats.total_bytes += body.len() as u64;
            }
        }

        Ok(stats)
    }

    /// 删除所有过期条目，返回删除数量
    pub fn purge_stale(&self) -> StorageResult<usize> {
        let mut removed = 0;

        for (key, meta) in self.entries()? {
            if self.is_fresh(meta.fetched_at) {
                continue;
            }
            // 先删元数据，中途失败时剩下的响应体只会被当作未命中
            self.storage.remove(&format!("{}{}", key, META_SUFFIX))?;
            self.storage.remove(&format!("{}{}", key, BODY_SUFFIX))?;
            removed += 1;
        }

        Ok(removed)
    }

    fn entries(&self) -> StorageResult<Vec<(String, CacheMeta)>> {
        let mut entries = Vec::new();

        for name in self.storage.keys()? {
            if let Some(key) = name.strip_suffix(META_SUFFIX) {
                if let Some(meta) = self.read_meta(key)? {
                    entries.push((key.to_string(), meta));
                }
            }
        }

        Ok(entries)
    }

    fn read_meta(&self, key: &str) -> StorageResult<Option<CacheMeta>> {
        let meta_key = format!("{}{}", key, META_SUFFIX);

        match self.storage.read(&meta_key)? {
            None => Ok(None),
            Some(bytes) => match serde_json::from_slice::<CacheMeta>(&bytes) {
                Ok(meta) => Ok(Some(meta)),
                Err(e) => {
                    warn!(key = %meta_key, error = %e, "unreadable cache metadata, treating as miss");
                    Ok(None)
                }
            },
        }
    }
}
