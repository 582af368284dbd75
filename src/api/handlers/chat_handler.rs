use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    error::AppError,
    language::Language,
};

/// 处理一轮对话
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.metrics.record_http_request();

    if request.message.trim().is_empty() {
        state.metrics.record_error();
        return Err(AppError::Validation("消息不能为空".to_string()));
    }

    debug!("收到对话请求 (user: {:?})", request.user_id);

    // 无法识别的语言代码按未指定处理，交给自动检测
    let language = request.language.as_deref().and_then(Language::parse);

    let outcome = state
        .chat_service
        .chat(request.user_id.as_deref(), &request.message, language)
        .await;

    state.metrics.record_chat_turn(outcome.degraded);

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        language: outcome.language.as_str().to_string(),
        user_id: outcome.user_id,
    }))
}
