//! 对话消息模型

use serde::{Deserialize, Serialize};

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 用户消息
    User,
    /// 助手消息
    Assistant,
}

impl Role {
    /// 发送给模型 API 的角色标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 单条对话消息
///
/// 创建后不可变；短期记忆与向量索引各自持有独立副本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// 角色
    pub role: Role,
    /// 内容
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ChatTurn::user("你好");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"你好"}"#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<ChatTurn>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }
}
