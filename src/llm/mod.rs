//! 对话模型模块
//!
//! 中文无条件使用 DeepSeek；其余语言共用一个备选模型（多对一的
//! 语言分组），后者只在配置了 OpenAI 密钥时初始化。DeepSeek 与
//! OpenAI 共用 chat/completions 协议，因此只有一个客户端实现。

use async_trait::async_trait;
use reqwest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::language::Language;
use crate::models::ChatTurn;

/// 备选模型缺少的环境变量，报错时提示用
const OPENAI_KEY_ENV: &str = "NUANYANG_LLM__OPENAI_API_KEY";

/// 发送给模型 API 的单条消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI 兼容的 chat/completions 客户端
#[derive(Debug)]
pub struct OpenAiCompatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatModel {
    pub fn new(base_url: &str, api_key: &str, model: &str, temperature: f32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    /// 调用一次对话补全，返回回复文本
    pub async fn complete(&self, messages: &[ApiMessage]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature
            }))
            .send()
            .await
            .map_err(|e| AppError::LlmUpstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LlmUpstream(format!(
                "模型 {} 返回 {}: {}",
                self.model, status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LlmUpstream(format!("响应解析失败: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::LlmUpstream("模型返回了空的 choices".to_string()))
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// 模型调度器
#[async_trait]
pub trait ModelDispatcher: Send + Sync {
    /// 以系统提示词 + 历史 + 当前用户消息调用语言对应的模型
    async fn dispatch(
        &self,
        language: Language,
        system_prompt: &str,
        user_message: &str,
        history: &[ChatTurn],
    ) -> Result<String>;
}

/// 模型管理器
pub struct LlmManager {
    deepseek: OpenAiCompatModel,
    alternate: Option<OpenAiCompatModel>,
}

impl LlmManager {
    pub fn new(deepseek: OpenAiCompatModel, alternate: Option<OpenAiCompatModel>) -> Self {
        Self { deepseek, alternate }
    }

    /// 根据语言选择模型
    fn select_model(&self, language: Language) -> Result<&OpenAiCompatModel> {
        match language {
            Language::Zh => Ok(&self.deepseek),
            other => self.alternate.as_ref().ok_or_else(|| AppError::LlmNotConfigured {
                language: other.as_str().to_string(),
                env_var: OPENAI_KEY_ENV.to_string(),
            }),
        }
    }

    /// 按顺序组装消息：system、历史轮次、当前用户消息
    fn build_messages(
        system_prompt: &str,
        history: &[ChatTurn],
        user_message: &str,
    ) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ApiMessage::system(system_prompt));

        for turn in history {
            messages.push(ApiMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }

        messages.push(ApiMessage::user(user_message));
        messages
    }
}

#[async_trait]
impl ModelDispatcher for LlmManager {
    async fn dispatch(
        &self,
        language: Language,
        system_prompt: &str,
        user_message: &str,
        history: &[ChatTurn],
    ) -> Result<String> {
        let model = self.select_model(language)?;
        let messages = Self::build_messages(system_prompt, history, user_message);
        model.complete(&messages).await
    }
}

/// 按配置创建模型调度器
pub fn create_llm_manager(config: &LlmConfig) -> Result<Box<dyn ModelDispatcher>> {
    let deepseek = OpenAiCompatModel::new(
        &config.deepseek_base_url,
        &config.deepseek_api_key,
        &config.deepseek_model,
        config.temperature,
    )?;
    info!("中文模型就绪: {}", config.deepseek_model);

    let alternate = if config.openai_api_key.is_empty() {
        info!("未配置 OpenAI API 密钥，荷兰语/英语对话将不可用");
        None
    } else {
        info!("备选模型就绪: {}", config.openai_model);
        Some(OpenAiCompatModel::new(
            &config.openai_base_url,
            &config.openai_api_key,
            &config.openai_model,
            config.temperature,
        )?)
    };

    Ok(Box::new(LlmManager::new(deepseek, alternate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn deepseek(base_url: &str) -> OpenAiCompatModel {
        OpenAiCompatModel::new(base_url, "test-key", "deepseek-chat", 0.7).unwrap()
    }

    #[test]
    fn test_build_messages_order() {
        let history = vec![
            ChatTurn::user("你好"),
            ChatTurn::assistant("您好呀"),
        ];
        let messages = LlmManager::build_messages("系统提示", &history, "今天天气怎么样");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "系统提示");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3], ApiMessage::user("今天天气怎么样"));
    }

    #[test]
    fn test_zh_always_uses_deepseek() {
        let manager = LlmManager::new(deepseek("https://api.deepseek.com/v1"), None);
        let model = manager.select_model(Language::Zh).unwrap();
        assert_eq!(model.model_name(), "deepseek-chat");
    }

    #[test]
    fn test_missing_alternate_is_configuration_error() {
        let manager = LlmManager::new(deepseek("https://api.deepseek.com/v1"), None);

        let err = manager.select_model(Language::En).unwrap_err();
        match &err {
            AppError::LlmNotConfigured { language, env_var } => {
                assert_eq!(language, "en");
                assert_eq!(env_var, OPENAI_KEY_ENV);
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_complete_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "您好，今天过得怎么样？" } }]
            })))
            .mount(&server)
            .await;

        let manager = LlmManager::new(deepseek(&server.uri()), None);
        let reply = manager
            .dispatch(Language::Zh, "系统提示", "你好", &[])
            .await
            .unwrap();
        assert_eq!(reply, "您好，今天过得怎么样？");
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broken"))
            .mount(&server)
            .await;

        let manager = LlmManager::new(deepseek(&server.uri()), None);
        let err = manager
            .dispatch(Language::Zh, "系统提示", "你好", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LlmUpstream(_)));
        assert!(!err.is_configuration());
    }
}
