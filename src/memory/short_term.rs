//! 短期会话记忆
//!
//! 每个用户一条有序消息日志，最多保留最近 N 轮，每次写入刷新
//! 整个会话的过期时间（滑动 TTL）。后端不可达时读取返回空、
//! 写入与清除为空操作，绝不向编排器抛出致命错误。

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::RedisConfig;
use crate::error::Result;
use crate::models::{ChatTurn, Role};

/// 键值缓存后端（带按键 TTL）
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Redis 缓存后端
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// 连接 Redis
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// 内存缓存后端（测试与 Redis 不可用时的兜底）
pub struct MemoryStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            let (value, deadline) = entry.value();
            if Instant::now() < *deadline {
                return Ok(Some(value.clone()));
            }
        }
        // 已过期的键顺手移除
        self.entries.remove(key);
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// 短期记忆读取结果
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRead {
    /// 最近的对话轮（时间正序）
    pub turns: Vec<ChatTurn>,
    /// 是否因后端故障而降级为空
    pub degraded: bool,
}

impl HistoryRead {
    pub fn empty() -> Self {
        Self {
            turns: Vec::new(),
            degraded: false,
        }
    }

    pub fn degraded() -> Self {
        Self {
            turns: Vec::new(),
            degraded: true,
        }
    }
}

/// 短期记忆写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStatus {
    /// 已写入
    Stored,
    /// 后端故障，本轮未入短期记忆
    Dropped,
}

/// 短期会话记忆
pub struct ShortTermMemory {
    store: Arc<dyn CacheStore>,
    max_turns: usize,
    ttl_secs: u64,
}

impl ShortTermMemory {
    pub fn new(store: Arc<dyn CacheStore>, max_turns: usize, ttl_secs: u64) -> Self {
        Self {
            store,
            max_turns,
            ttl_secs,
        }
    }

    fn key(user_id: &str) -> String {
        format!("conversation:{}", user_id)
    }

    /// 读取某用户的最近对话
    ///
    /// 会话不存在或已过期返回空；后端故障返回空并置 degraded。
    pub async fn recent(&self, user_id: &str) -> HistoryRead {
        let key = Self::key(user_id);

        let data = match self.store.get(&key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("读取短期记忆失败 (user: {}): {}", user_id, e);
                return HistoryRead::degraded();
            }
        };

        match data {
            Some(raw) => match serde_json::from_str::<Vec<ChatTurn>>(&raw) {
                Ok(turns) => HistoryRead {
                    turns,
                    degraded: false,
                },
                Err(e) => {
                    // 缓存内容损坏按后端故障处理
                    warn!("短期记忆内容无法解析 (user: {}): {}", user_id, e);
                    HistoryRead::degraded()
                }
            },
            None => HistoryRead::empty(),
        }
    }

    /// 追加一轮消息
    ///
    /// 截断到最近 max_turns 条并以新的 TTL 整体重写，
    /// 因此每次写入都会刷新整个会话的过期时间。
    pub async fn append(&self, user_id: &str, role: Role, content: &str) -> AppendStatus {
        let mut turns = self.recent(user_id).await.turns;
        turns.push(ChatTurn::new(role, content));

        if turns.len() > self.max_turns {
            let excess = turns.len() - self.max_turns;
            turns.drain(..excess);
        }

        let serialized = match serde_json::to_string(&turns) {
            Ok(s) => s,
            Err(e) => {
                warn!("序列化短期记忆失败 (user: {}): {}", user_id, e);
                return AppendStatus::Dropped;
            }
        };

        match self
            .store
            .set_ex(&Self::key(user_id), &serialized, self.ttl_secs)
            .await
        {
            Ok(()) => AppendStatus::Stored,
            Err(e) => {
                warn!("写入短期记忆失败 (user: {}): {}", user_id, e);
                AppendStatus::Dropped
            }
        }
    }

    /// 清空某用户的会话
    pub async fn clear(&self, user_id: &str) {
        if let Err(e) = self.store.delete(&Self::key(user_id)).await {
            warn!("清除短期记忆失败 (user: {}): {}", user_id, e);
        }
    }
}

/// 创建短期记忆
pub fn create_short_term_memory(store: Arc<dyn CacheStore>, config: &RedisConfig) -> ShortTermMemory {
    ShortTermMemory::new(store, config.max_turns, config.ttl_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    /// 始终失败的后端，用于断言降级路径
    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Cache("connection refused".into()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
            Err(AppError::Cache("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(AppError::Cache("connection refused".into()))
        }
    }

    fn memory(max_turns: usize, ttl_secs: u64) -> ShortTermMemory {
        ShortTermMemory::new(Arc::new(MemoryStore::new()), max_turns, ttl_secs)
    }

    #[tokio::test]
    async fn test_recent_returns_empty_without_session() {
        let memory = memory(10, 3600);
        let read = memory.recent("nobody").await;
        assert!(read.turns.is_empty());
        assert!(!read.degraded);
    }

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let memory = memory(10, 3600);

        memory.append("u1", Role::User, "你好").await;
        memory.append("u1", Role::Assistant, "您好呀").await;

        let read = memory.recent("u1").await;
        assert_eq!(read.turns.len(), 2);
        assert_eq!(read.turns[0], ChatTurn::user("你好"));
        assert_eq!(read.turns[1], ChatTurn::assistant("您好呀"));
    }

    #[tokio::test]
    async fn test_capped_at_max_turns_dropping_oldest() {
        let memory = memory(10, 3600);

        for i in 0..12 {
            memory.append("u1", Role::User, &format!("消息{}", i)).await;
        }

        let read = memory.recent("u1").await;
        assert_eq!(read.turns.len(), 10);
        // 最旧的两条被丢弃，剩余保持原有相对顺序
        assert_eq!(read.turns[0].content, "消息2");
        assert_eq!(read.turns[9].content, "消息11");
    }

    #[tokio::test]
    async fn test_session_expires() {
        let memory = memory(10, 0);

        memory.append("u1", Role::User, "你好").await;
        let read = memory.recent("u1").await;
        assert!(read.turns.is_empty());
        assert!(!read.degraded);
    }

    #[tokio::test]
    async fn test_append_refreshes_whole_session_ttl() {
        let memory = memory(10, 1);

        memory.append("u1", Role::User, "你好").await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        // 第二次写入把整个会话的过期时间推到 1 秒之后
        memory.append("u1", Role::Assistant, "您好呀").await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        // 此时第一条消息的原始过期点已过，但会话整体仍然存活
        let read = memory.recent("u1").await;
        assert_eq!(read.turns.len(), 2);
        assert_eq!(read.turns[0].content, "你好");
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let memory = memory(10, 3600);

        memory.append("u1", Role::User, "你好").await;
        memory.clear("u1").await;

        assert!(memory.recent("u1").await.turns.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_without_error() {
        let memory = ShortTermMemory::new(Arc::new(FailingStore), 10, 3600);

        let read = memory.recent("u1").await;
        assert!(read.turns.is_empty());
        assert!(read.degraded);

        let status = memory.append("u1", Role::User, "你好").await;
        assert_eq!(status, AppendStatus::Dropped);

        // clear 也只是空操作
        memory.clear("u1").await;
    }

    #[tokio::test]
    async fn test_corrupt_cache_content_degrades() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_ex("conversation:u1", "not-json", 3600)
            .await
            .unwrap();

        let memory = ShortTermMemory::new(store, 10, 3600);
        let read = memory.recent("u1").await;
        assert!(read.turns.is_empty());
        assert!(read.degraded);
    }
}
