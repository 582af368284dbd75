//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    Cache(String),

    /// 连接错误
    #[error("连接错误: {0}")]
    Connection(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 向量索引错误
    #[error("向量索引错误: {0}")]
    VectorIndex(String),

    /// 嵌入模型错误
    #[error("嵌入模型错误: {0}")]
    Embedding(String),

    /// 对话模型未配置（缺少凭证）
    #[error("语言 {language} 的对话模型未配置，请设置 {env_var}")]
    LlmNotConfigured { language: String, env_var: String },

    /// 对话模型上游错误
    #[error("对话模型调用失败: {0}")]
    LlmUpstream(String),
}

impl AppError {
    /// 是否属于"凭证缺失"一类的配置错误
    ///
    /// 编排器据此选择对用户展示哪一种道歉话术。
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::LlmNotConfigured { .. } | AppError::Config(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Connection(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Connection(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            AppError::Database(_) => (500, "INTERNAL_ERROR".to_string()),
            AppError::Cache(_) => (500, "CACHE_ERROR".to_string()),
            AppError::VectorIndex(_) => (500, "INDEX_ERROR".to_string()),
            AppError::Embedding(_) => (500, "EMBEDDING_ERROR".to_string()),
            AppError::LlmNotConfigured { .. } => (500, "LLM_NOT_CONFIGURED".to_string()),
            AppError::LlmUpstream(_) => (502, "LLM_UPSTREAM_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_distinguished() {
        let err = AppError::LlmNotConfigured {
            language: "en".to_string(),
            env_var: "NUANYANG_LLM__OPENAI_API_KEY".to_string(),
        };
        assert!(err.is_configuration());
        assert!(!AppError::LlmUpstream("timeout".to_string()).is_configuration());
    }

    #[test]
    fn test_status_code_mapping() {
        let (status, code) = (&AppError::Validation("empty".into())).into();
        assert_eq!(status, 400);
        assert_eq!(code, "BAD_REQUEST");

        let (status, _) = (&AppError::LlmUpstream("boom".into())).into();
        assert_eq!(status, 502);
    }
}
