//! URL 处理工具
//!
//! 代理入口接收的目标地址在这里完成解码、修复和校验。

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::OnceLock;

pub use url::Url;

use crate::core::ProxyError;

fn collapsed_scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(https?:)/([^/])").expect("static regex is valid"))
}

/// 校验查询参数形式的目标地址
///
/// 必须是带主机名的 `http`/`https` 绝对地址；失败时返回 [`ProxyError::InvalidUrl`]。
pub fn parse_target_url(raw: &str) -> Result<Url, ProxyError> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return Err(ProxyError::InvalidUrl("missing url parameter".to_string()));
    }

    let url = Url::parse(candidate)
        .map_err(|e| ProxyError::InvalidUrl(format!("'{}': {}", candidate, e)))?;

    if !is_url_and_has_protocol(&url) {
        return Err(ProxyError::InvalidUrl(format!(
            "'{}': scheme must be http or https",
            candidate
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ProxyError::InvalidUrl(format!("'{}': missing host", candidate))),
    }
}

/// 校验路径形式的目标地址（`/proxy/<url>` 中 `<url>` 部分的原始文本）
///
/// 先做一次百分号解码，再把被折叠的 `scheme:/host` 修复为 `scheme://host`。
pub fn parse_path_target_url(raw_path: &str) -> Result<Url, ProxyError> {
    let trimmed = raw_path.trim_start_matches('/');
    let decoded = percent_decode_str(trimmed).decode_utf8_lossy();
    let repaired = repair_collapsed_scheme(&decoded);

    parse_target_url(&repaired)
}

/// `https:/example.com` → `https://example.com`
pub fn repair_collapsed_scheme(url: &str) -> String {
    collapsed_scheme_regex()
        .replace(url, "${1}//${2}")
        .into_owned()
}

/// 检查是否为 http(s) 地址
pub fn is_url_and_has_protocol(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// 将相对引用解析为绝对地址；无法解析时返回 `None`
pub fn resolve_url(from: &Url, to: &str) -> Option<Url> {
    from.join(to).ok()
}
