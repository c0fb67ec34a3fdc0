//! 出站 HTTP 请求

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use crate::core::ProxyError;

/// 单次 GET 请求的抽象
///
/// 实现必须有有限的超时；失败统一映射为 [`ProxyError::UpstreamUnavailable`]。
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ProxyError>;
}

/// 基于 `reqwest` 阻塞客户端的实现
///
/// 客户端内部持有自己的运行时，不能在异步上下文中创建或销毁。
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| ProxyError::UpstreamUnavailable(format!("invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::UpstreamUnavailable(format!("failed to build client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ProxyError> {
        debug!(url = %url, "fetching upstream page");

        let response = self.client.get(url.as_str()).send().map_err(|e| {
            warn!(url = %url, error = %e, "upstream request failed");
            ProxyError::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "upstream returned an error status");
            return Err(ProxyError::UpstreamUnavailable(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .map_err(|e| ProxyError::UpstreamUnavailable(e.to_string()))?;

        if body.is_empty() {
            return Err(ProxyError::UpstreamUnavailable("empty response body".to_string()));
        }

        Ok(body.to_vec())
    }
}
