//! Web 路由处理器
//!
//! 流水线（抓取、解析、改写）是阻塞的，且 DOM 不能跨线程，统一放到阻塞线程池执行。

pub mod admin;
pub mod proxy;

pub use admin::*;
pub use proxy::*;

use tokio::task;

use crate::core::ProxyError;
use crate::web::types::WebError;

pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, WebError>
where
    F: FnOnce() -> Result<T, ProxyError> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(result) => result.map_err(WebError::from),
        Err(e) => Err(WebError::Task(e.to_string())),
    }
}
