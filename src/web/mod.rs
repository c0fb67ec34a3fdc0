//! Web 服务器模块
//!
//! 代理入口、管理端单词审阅和静态文件服务

pub mod config;
pub mod handlers;
pub mod routes;
pub mod templates;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::io;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::core::Proxy;

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    proxy: Arc<Proxy>,
}

impl WebServer {
    pub fn new(config: WebConfig, proxy: Arc<Proxy>) -> Self {
        Self { config, proxy }
    }

    /// 启动 Web 服务器，直到监听失败才返回
    pub async fn start(&self) -> io::Result<()> {
        let state = Arc::new(AppState::new(self.proxy.clone()));
        let app = create_router(state, &self.config);

        let listener = tokio::net::TcpListener::bind(self.config.listen_address()).await?;
        tracing::info!(
            "Web server starting at http://{} (proxy entry {})",
            self.config.listen_address(),
            self.proxy.options().proxy_path
        );

        axum::serve(listener, app).await
    }
}

/// 创建路由器
pub fn create_router(state: Arc<AppState>, config: &WebConfig) -> Router {
    let mut app = create_routes(&state.proxy_path).with_state(state);

    // 添加静态文件服务（如果配置了）
    if let Some(static_dir) = &config.static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app
}
