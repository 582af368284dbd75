use async_trait::async_trait;
use surrealdb::{Surreal, engine::any::Any};

use crate::error::{AppError, Result};
use crate::models::{ConversationRecord, User};

/// 用户仓储
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户
    async fn create_user(
        &self,
        name: &str,
        age: u32,
        gender: &str,
        language: &str,
    ) -> Result<User>;

    /// 根据 ID 获取用户
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// 获取任意一个用户，没有则创建默认用户（MVP 单用户模式）
    async fn get_or_create_default_user(&self) -> Result<User>;
}

/// 对话历史仓储
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 保存一轮完整对话，返回 conversation_id
    async fn save_conversation(
        &self,
        user_id: &str,
        language: &str,
        user_message: &str,
        bot_response: &str,
    ) -> Result<String>;

    /// 按时间倒序列出某用户最近的对话
    async fn recent_conversations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>>;
}

/// 用户仓储实现
#[derive(Clone)]
pub struct SurrealUserRepository {
    db: Surreal<Any>,
}

impl SurrealUserRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SurrealUserRepository {
    async fn create_user(
        &self,
        name: &str,
        age: u32,
        gender: &str,
        language: &str,
    ) -> Result<User> {
        let user = User::new(name, age, gender, language);
        let created: Option<User> = self
            .db
            .create(("user", user.user_id.clone()))
            .content(user.clone())
            .await?;

        created.ok_or_else(|| {
            AppError::Database(format!("Failed to create user: {}", user.user_id))
        })
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let result: Option<User> = self.db.select(("user", user_id)).await?;
        Ok(result)
    }

    async fn get_or_create_default_user(&self) -> Result<User> {
        let existing: Vec<User> = self
            .db
            .query("SELECT * FROM user ORDER BY created_at ASC LIMIT 1")
            .await?
            .take(0)?;

        match existing.into_iter().next() {
            Some(user) => Ok(user),
            None => self.create_user("测试用户", 70, "female", "zh").await,
        }
    }
}

/// 对话历史仓储实现
#[derive(Clone)]
pub struct SurrealConversationRepository {
    db: Surreal<Any>,
}

impl SurrealConversationRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationRepository for SurrealConversationRepository {
    async fn save_conversation(
        &self,
        user_id: &str,
        language: &str,
        user_message: &str,
        bot_response: &str,
    ) -> Result<String> {
        let record = ConversationRecord::new(user_id, language, user_message, bot_response);
        let created: Option<ConversationRecord> = self
            .db
            .create(("conversation", record.conversation_id.clone()))
            .content(record.clone())
            .await?;

        created
            .map(|r| r.conversation_id)
            .ok_or_else(|| AppError::Database("Failed to save conversation".to_string()))
    }

    async fn recent_conversations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>> {
        let result: Vec<ConversationRecord> = self
            .db
            .query(
                "SELECT * FROM conversation WHERE user_id = $user_id \
                 ORDER BY created_at DESC LIMIT $limit",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::SurrealPool;

    async fn mem_db() -> Surreal<Any> {
        let config = DatabaseConfig {
            url: "mem://".into(),
            namespace: "test".into(),
            database: "test".into(),
            username: String::new(),
            password: String::new(),
        };
        let pool = SurrealPool::new(&config).await.unwrap();
        pool.inner().await
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = SurrealUserRepository::new(mem_db().await);

        let created = repo.create_user("王奶奶", 78, "female", "zh").await.unwrap();
        let fetched = repo.get_user(&created.user_id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "王奶奶");
        assert_eq!(fetched.age, 78);
        assert_eq!(fetched.preferred_language, "zh");
    }

    #[tokio::test]
    async fn test_get_missing_user_is_none() {
        let repo = SurrealUserRepository::new(mem_db().await);
        assert!(repo.get_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_user_created_once() {
        let repo = SurrealUserRepository::new(mem_db().await);

        let first = repo.get_or_create_default_user().await.unwrap();
        assert_eq!(first.name, "测试用户");
        assert_eq!(first.age, 70);

        let second = repo.get_or_create_default_user().await.unwrap();
        assert_eq!(second.user_id, first.user_id);
    }

    #[tokio::test]
    async fn test_save_and_list_conversations() {
        let repo = SurrealConversationRepository::new(mem_db().await);

        let id = repo
            .save_conversation("u1", "zh", "你好", "您好呀")
            .await
            .unwrap();
        assert!(!id.is_empty());

        repo.save_conversation("u1", "zh", "今天天气如何", "晴天")
            .await
            .unwrap();
        repo.save_conversation("u2", "en", "hello", "hi")
            .await
            .unwrap();

        let conversations = repo.recent_conversations("u1", 10).await.unwrap();
        assert_eq!(conversations.len(), 2);
        assert!(conversations.iter().all(|c| c.user_id == "u1"));

        // limit 生效
        let capped = repo.recent_conversations("u1", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }
}
