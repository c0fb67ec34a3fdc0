//! 代理入口处理器

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use url::Url;

use super::run_blocking;
use crate::utils::url::{parse_path_target_url, parse_target_url};
use crate::web::types::{plain_text, AppState, WebError};

/// `GET /proxy?url=<encoded>[&showtext=1]`
pub async fn proxy_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let raw = params.get("url").map(String::as_str).unwrap_or("");
    let url = parse_target_url(raw)?;
    let show_text = params
        .get("showtext")
        .map(|value| is_truthy(value))
        .unwrap_or(false);

    let entry = proxy_entry(&headers, &state.proxy_path);
    serve(state, url, show_text, entry).await
}

/// `GET /proxy/<url>`
///
/// 使用原始请求路径而不是解码后的路由参数，以免目标地址被解码两次。
/// 请求自身的查询串属于目标地址。
pub async fn proxy_path_style(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let raw = uri
        .path()
        .strip_prefix(state.proxy_path.as_str())
        .unwrap_or_else(|| uri.path());
    let mut url = parse_path_target_url(raw)?;

    if let Some(query) = uri.query().filter(|query| !query.is_empty()) {
        url.set_query(Some(query));
    }

    let entry = proxy_entry(&headers, &state.proxy_path);
    serve(state, url, false, entry).await
}

async fn serve(
    state: Arc<AppState>,
    url: Url,
    show_text: bool,
    entry: String,
) -> Result<Response, WebError> {
    tracing::info!(url = %url, show_text, "代理请求");
    let proxy = state.proxy.clone();

    if show_text {
        let text = run_blocking(move || proxy.page_text(&url)).await?;
        return Ok(plain_text(StatusCode::OK, text));
    }

    let html = run_blocking(move || proxy.render_page(&url, &entry)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

/// 改写后链接指向的代理入口
///
/// 有 `Host` 头时生成绝对地址（协议取自 `X-Forwarded-Proto`），否则退回相对路径。
pub fn proxy_entry(headers: &HeaderMap, proxy_path: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty() && !host.contains(['/', '"', '<', '>', ' ']));

    match host {
        Some(host) => {
            let scheme = match headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
            {
                Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
                _ => "http",
            };
            format!("{}://{}{}", scheme, host, proxy_path)
        }
        None => proxy_path.to_string(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
