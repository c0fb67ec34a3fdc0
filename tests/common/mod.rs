// 集成测试公共模块
//
// 内存存储、可计数的假抓取器和可控时钟

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use url::Url;

use wordswap::core::{Proxy, ProxyError, ProxyOptions};
use wordswap::network::{Clock, Fetcher};
use wordswap::storage::MemoryStorage;

pub const SITE: &str = "https://site.example/";

/// 测试页面：正文、脚本、样式、链接、签名图片和广告脚本
pub const SAMPLE_PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <title>Sample</title>
  <style>.cat { color: red; }</style>
</head>
<body>
  <h1>The cat and the dog</h1>
  <p>Every cat likes another cat, said the dog.</p>
  <p>concatenate cat scattered</p>
  <noscript>cat cat cat cat</noscript>
  <a id="section" href="#section">Jump</a>
  <a id="js" href="javascript:void(0)">Click</a>
  <a id="page" href="/page">Page</a>
  <a id="mail" href="mailto:someone@site.example">Mail</a>
  <img class="w-100 h-auto hero" src="/hero.jpg">
  <img class="w-100" src="/thumb.jpg">
  <iframe src="https://ib.adnxs.com/ad"></iframe>
  <script>var cat = "cat";</script>
</body>
</html>"##;

/// 按地址返回固定内容的抓取器，记录调用次数
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, Vec<u8>>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn set_page(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.as_bytes().to_vec());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ProxyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(ProxyError::UpstreamUnavailable("connection refused".to_string()));
        }

        self.pages
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ProxyError::UpstreamUnavailable("HTTP 404 Not Found".to_string()))
    }
}

/// 手动推进的时钟
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Self(Mutex::new(start))
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.0.lock().unwrap();
        *now = *now + chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// 全内存的代理实例
pub struct TestProxy {
    pub proxy: Arc<Proxy>,
    pub fetcher: Arc<FakeFetcher>,
    pub clock: Arc<FixedClock>,
    pub cache_storage: Arc<MemoryStorage>,
    pub dictionary_storage: Arc<MemoryStorage>,
}

impl TestProxy {
    pub fn new() -> Self {
        Self::with_options(test_options())
    }

    pub fn with_options(options: ProxyOptions) -> Self {
        let fetcher = Arc::new(FakeFetcher::new().with_page(SITE, SAMPLE_PAGE));
        let clock = Arc::new(FixedClock::new());
        let cache_storage = Arc::new(MemoryStorage::new());
        let dictionary_storage = Arc::new(MemoryStorage::new());

        let proxy = Arc::new(Proxy::with_storage(
            options,
            cache_storage.clone(),
            dictionary_storage.clone(),
            fetcher.clone(),
            clock.clone(),
        ));

        Self {
            proxy,
            fetcher,
            clock,
            cache_storage,
            dictionary_storage,
        }
    }
}

pub fn test_options() -> ProxyOptions {
    ProxyOptions::builtin()
}

pub fn site_url() -> Url {
    Url::parse(SITE).unwrap()
}

pub fn render(test: &TestProxy, entry: &str) -> String {
    String::from_utf8(test.proxy.render_page(&site_url(), entry).unwrap()).unwrap()
}
