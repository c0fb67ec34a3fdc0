//! Web 模块的数据类型定义

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::core::{Proxy, ProxyError};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<Proxy>,
    pub proxy_path: String,
}

impl AppState {
    pub fn new(proxy: Arc<Proxy>) -> Self {
        let proxy_path = proxy.options().proxy_path.clone();
        Self { proxy, proxy_path }
    }
}

/// 处理器错误，统一以纯文本返回
#[derive(Debug)]
pub enum WebError {
    Proxy(ProxyError),
    /// 请求缺少必需参数
    BadRequest(&'static str),
    /// 阻塞任务崩溃或被取消
    Task(String),
}

impl From<ProxyError> for WebError {
    fn from(error: ProxyError) -> Self {
        WebError::Proxy(error)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() && !matches!(self, ProxyError::UpstreamUnavailable(_)) {
            tracing::error!("请求处理失败: {}", self);
        } else {
            tracing::warn!("请求被拒绝: {}", self);
        }

        plain_text(status, self.public_message().to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Proxy(error) => error.into_response(),
            WebError::BadRequest(message) => plain_text(StatusCode::BAD_REQUEST, message.to_string()),
            WebError::Task(message) => {
                tracing::error!("处理任务失败: {}", message);
                plain_text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        }
    }
}

pub fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
