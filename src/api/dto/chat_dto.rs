//! 对话 DTO
//!
//! 定义对话接口的请求和响应数据结构。

use serde::{Deserialize, Serialize};

/// 对话请求
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ChatRequest {
    /// 用户消息
    pub message: String,
    /// 用户 ID（缺省使用默认用户）
    pub user_id: Option<String>,
    /// 语言代码（缺省自动检测）
    pub language: Option<String>,
}

/// 对话响应
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// 助手回复
    pub reply: String,
    /// 本轮使用的语言代码
    pub language: String,
    /// 实际使用的用户 ID
    pub user_id: String,
}
