//! Chat Routes
//!
//! 定义对话相关的 API 路由。

use crate::api::handlers::chat_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建对话路由器
pub fn create_chat_router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}
