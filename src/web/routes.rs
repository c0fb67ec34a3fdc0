//! Web 路由定义

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::web::{handlers::*, types::AppState};

/// 管理端审阅页路径
pub const ADMIN_WORDS_PATH: &str = "/admin/words";

/// 代理入口路径可配置，其余路由固定
pub fn create_routes(proxy_path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(proxy_path, get(proxy_query))
        .route(&format!("{}/*target", proxy_path), get(proxy_path_style))
        .route(ADMIN_WORDS_PATH, get(review_page).post(submit_review))
}
