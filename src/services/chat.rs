//! 对话编排服务
//!
//! 单轮对话的完整管线：语言识别 → 用户解析 → 语义检索 → 短期
//! 历史 → 提示词组装 → 模型调用 → 双写持久化。
//!
//! 失败策略：检索类故障一律降级为空输入继续；模型调用失败终结
//! 本轮，转换为本地化的道歉话术返回；持久化故障只记日志，不影响
//! 已经生成的回复。任何路径都不会把错误抛到 HTTP 边界。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::language::{Language, LanguageResolver};
use crate::llm::ModelDispatcher;
use crate::memory::{AppendStatus, IndexStatus, SemanticMemory, ShortTermMemory};
use crate::models::{Role, User};
use crate::prompts::{ApologyKind, PromptComposer};
use crate::storage::{ConversationRepository, UserRepository};

/// 一轮对话的结果
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// 返回给用户的回复（模型输出或道歉话术）
    pub reply: String,
    /// 本轮使用的语言
    pub language: Language,
    /// 实际使用的用户 ID
    pub user_id: String,
    /// 本轮是否发生过降级（检索为空、写入失败或模型失败）
    pub degraded: bool,
}

/// 对话服务
#[async_trait]
pub trait ChatService: Send + Sync {
    /// 处理一轮对话
    ///
    /// user_id 缺省时使用（必要时创建）默认用户；language 缺省时
    /// 自动检测。该方法对调用方永不失败。
    async fn chat(
        &self,
        user_id: Option<&str>,
        message: &str,
        language: Option<Language>,
    ) -> ChatOutcome;
}

/// 对话服务实现
pub struct ChatServiceImpl {
    resolver: LanguageResolver,
    composer: PromptComposer,
    users: Arc<dyn UserRepository>,
    conversations: Arc<dyn ConversationRepository>,
    short_term: Arc<ShortTermMemory>,
    semantic: Arc<SemanticMemory>,
    dispatcher: Arc<dyn ModelDispatcher>,
    context_limit: usize,
}

impl ChatServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: LanguageResolver,
        users: Arc<dyn UserRepository>,
        conversations: Arc<dyn ConversationRepository>,
        short_term: Arc<ShortTermMemory>,
        semantic: Arc<SemanticMemory>,
        dispatcher: Arc<dyn ModelDispatcher>,
        context_limit: usize,
    ) -> Self {
        Self {
            resolver,
            composer: PromptComposer::new(),
            users,
            conversations,
            short_term,
            semantic,
            dispatcher,
            context_limit,
        }
    }

    /// 解析用户：查不到档案按新用户继续，绝不中断本轮
    async fn resolve_user(&self, user_id: Option<&str>) -> (String, Option<User>) {
        match user_id {
            Some(id) => match self.users.get_user(id).await {
                Ok(profile) => (id.to_string(), profile),
                Err(e) => {
                    warn!("查询用户 {} 失败，按新用户处理: {}", id, e);
                    (id.to_string(), None)
                }
            },
            None => match self.users.get_or_create_default_user().await {
                Ok(user) => (user.user_id.clone(), Some(user)),
                Err(e) => {
                    warn!("获取默认用户失败，按新用户处理: {}", e);
                    (Uuid::new_v4().to_string(), None)
                }
            },
        }
    }

    /// 成功拿到模型回复后的双写持久化，全部尽力而为
    async fn persist_turn(
        &self,
        user_id: &str,
        language: Language,
        user_message: &str,
        bot_response: &str,
    ) -> bool {
        let mut degraded = false;

        let conversation_id = match self
            .conversations
            .save_conversation(user_id, language.as_str(), user_message, bot_response)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("保存对话历史失败 (user: {}): {}", user_id, e);
                degraded = true;
                Uuid::new_v4().to_string()
            }
        };

        if self.short_term.append(user_id, Role::User, user_message).await == AppendStatus::Dropped
        {
            degraded = true;
        }
        if self
            .short_term
            .append(user_id, Role::Assistant, bot_response)
            .await
            == AppendStatus::Dropped
        {
            degraded = true;
        }

        if self
            .semantic
            .remember(user_id, language, user_message, bot_response, &conversation_id)
            .await
            == IndexStatus::Failed
        {
            degraded = true;
        }

        degraded
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn chat(
        &self,
        user_id: Option<&str>,
        message: &str,
        language: Option<Language>,
    ) -> ChatOutcome {
        let language = language.unwrap_or_else(|| self.resolver.detect(message));
        debug!("本轮语言: {}", language);

        let (user_id, profile) = self.resolve_user(user_id).await;

        let context = self
            .semantic
            .recall(&user_id, language, message, self.context_limit)
            .await;
        let history = self.short_term.recent(&user_id).await;

        let prompt = self
            .composer
            .compose(language, profile.as_ref(), &context.hits, message);

        let reply = match self
            .dispatcher
            .dispatch(language, &prompt.system_prompt, &prompt.user_message, &history.turns)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("模型调用失败 (user: {}, language: {}): {}", user_id, language, e);
                let kind = if e.is_configuration() {
                    ApologyKind::Configuration
                } else {
                    ApologyKind::Upstream
                };
                // 本轮终结：不写任何存储，返回道歉话术
                return ChatOutcome {
                    reply: self.composer.apology(language, kind).to_string(),
                    language,
                    user_id,
                    degraded: true,
                };
            }
        };

        let persist_degraded = self
            .persist_turn(&user_id, language, message, &reply)
            .await;

        ChatOutcome {
            reply,
            language,
            user_id,
            degraded: context.degraded || history.degraded || persist_degraded,
        }
    }
}

/// 创建对话服务
#[allow(clippy::too_many_arguments)]
pub fn create_chat_service(
    resolver: LanguageResolver,
    users: Arc<dyn UserRepository>,
    conversations: Arc<dyn ConversationRepository>,
    short_term: Arc<ShortTermMemory>,
    semantic: Arc<SemanticMemory>,
    dispatcher: Arc<dyn ModelDispatcher>,
    context_limit: usize,
) -> Box<dyn ChatService> {
    Box::new(ChatServiceImpl::new(
        resolver,
        users,
        conversations,
        short_term,
        semantic,
        dispatcher,
        context_limit,
    ))
}
