//! 管理端单词审阅处理器

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};

use super::run_blocking;
use crate::utils::url::parse_target_url;
use crate::web::templates::word_review_page;
use crate::web::types::{plain_text, AppState, WebError};

const SAVED_NOTICE: &str = "Replacements saved!";

/// `GET /admin/words?url=...`
pub async fn review_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, WebError> {
    let raw = params.get("url").map(String::as_str).unwrap_or("");
    let url = parse_target_url(raw)?;
    tracing::info!(url = %url, "单词审阅");

    let proxy = state.proxy.clone();
    let review = run_blocking(move || proxy.review_words(&url)).await?;

    Ok(Html(word_review_page(&review, &state.proxy_path, None)))
}

/// `POST /admin/words`
///
/// - `exclude_word` / `unexclude_word`：单词排除开关，返回纯文本
/// - 否则按 `url`（查询串或表单）保存 `replace_<id>` 字段并重新渲染
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    let proxy = state.proxy.clone();

    if let Some(word) = form.get("exclude_word") {
        let word = non_empty_word(word)?;
        run_blocking(move || proxy.exclude_word(&word)).await?;
        return Ok(plain_text(StatusCode::OK, "excluded".to_string()));
    }

    if let Some(word) = form.get("unexclude_word") {
        let word = non_empty_word(word)?;
        run_blocking(move || proxy.unexclude_word(&word)).await?;
        return Ok(plain_text(StatusCode::OK, "unexcluded".to_string()));
    }

    let raw = query
        .get("url")
        .or_else(|| form.get("url"))
        .ok_or(WebError::BadRequest("Missing url parameter."))?;
    let url = parse_target_url(raw)?;
    tracing::info!(url = %url, fields = form.len(), "保存单词替换");

    let review = run_blocking(move || {
        proxy.save_replacements(&url, &form)?;
        proxy.review_words(&url)
    })
    .await?;

    Ok(Html(word_review_page(&review, &state.proxy_path, Some(SAVED_NOTICE))).into_response())
}

fn non_empty_word(word: &str) -> Result<String, WebError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(WebError::BadRequest("Missing word."));
    }
    Ok(word.to_string())
}
