//! 对话历史模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 持久化的完整对话轮次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// 对话唯一标识
    pub conversation_id: String,
    /// 用户标识
    pub user_id: String,
    /// 语言代码
    pub language: String,
    /// 用户消息
    pub user_message: String,
    /// 助手回复
    pub bot_response: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(user_id: &str, language: &str, user_message: &str, bot_response: &str) -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            language: language.to_string(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            created_at: Utc::now(),
        }
    }
}
