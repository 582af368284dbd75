//! API 模块
//!
//! 提供 REST API 与静态页面支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use axum::Router;
use tower_http::services::ServeDir;

/// 创建应用路由
///
/// 未匹配的路径回落到静态资源目录（聊天页面）。
pub fn create_router(app_state: AppState, static_dir: &str) -> Router {
    Router::new()
        .merge(routes::chat_routes::create_chat_router())
        .with_state(app_state)
        .fallback_service(ServeDir::new(static_dir))
}
