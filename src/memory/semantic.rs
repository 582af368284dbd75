//! 语义记忆
//!
//! 把每轮对话嵌入后写入按语言划分的向量集合，检索时按 user_id
//! 过滤做相似度查询。未配置嵌入模型是受支持的降级模式；后端
//! 故障被转换为空结果，检索失败永远不会中断一轮对话。

use tracing::{debug, warn};
use uuid::Uuid;

use crate::index::{EmbeddingModel, RecordPayload, VectorIndex};
use crate::language::Language;
use crate::memory::ContextHit;

/// 语义检索结果
#[derive(Debug, Clone)]
pub struct ContextSearch {
    /// 按相似度降序的命中
    pub hits: Vec<ContextHit>,
    /// 是否因后端故障而降级为空
    pub degraded: bool,
}

impl ContextSearch {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            degraded: false,
        }
    }

    pub fn degraded() -> Self {
        Self {
            hits: Vec::new(),
            degraded: true,
        }
    }
}

/// 语义写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// 已写入向量索引
    Indexed,
    /// 未配置嵌入模型，按约定跳过
    Skipped,
    /// 后端故障，本轮未入索引
    Failed,
}

/// 语义记忆
pub struct SemanticMemory {
    index: Box<dyn VectorIndex>,
    embedding: Option<Box<dyn EmbeddingModel>>,
}

impl SemanticMemory {
    pub fn new(index: Box<dyn VectorIndex>, embedding: Option<Box<dyn EmbeddingModel>>) -> Self {
        Self { index, embedding }
    }

    /// 语言对应的集合名
    pub fn collection_name(language: Language) -> String {
        format!("conversations_{}", language.as_str())
    }

    /// 是否配置了嵌入模型
    pub fn enabled(&self) -> bool {
        self.embedding.is_some()
    }

    /// 启动时为每种语言确保集合存在（幂等）
    ///
    /// 单个集合创建失败只记日志，不阻止服务启动。
    pub async fn ensure_collections(&self) {
        let Some(embedding) = &self.embedding else {
            return;
        };

        for language in Language::supported() {
            let collection = Self::collection_name(language);
            match self
                .index
                .ensure_collection(&collection, embedding.dimension())
                .await
            {
                Ok(()) => debug!("向量集合就绪: {} (维度: {})", collection, embedding.dimension()),
                Err(e) => warn!("创建向量集合 {} 失败: {}", collection, e),
            }
        }
    }

    /// 把一轮对话写入向量索引
    pub async fn remember(
        &self,
        user_id: &str,
        language: Language,
        user_message: &str,
        bot_response: &str,
        conversation_id: &str,
    ) -> IndexStatus {
        let Some(embedding) = &self.embedding else {
            debug!("未配置嵌入模型，跳过语义记忆写入");
            return IndexStatus::Skipped;
        };

        let text = format!("用户: {}\n助手: {}", user_message, bot_response);

        let vector = match embedding.encode(&text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("生成 embedding 失败 (user: {}): {}", user_id, e);
                return IndexStatus::Failed;
            }
        };

        let payload = RecordPayload {
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            text,
        };

        let collection = Self::collection_name(language);
        match self
            .index
            .upsert(&collection, &Uuid::new_v4().to_string(), &vector, payload)
            .await
        {
            Ok(()) => {
                debug!("对话已写入向量集合 {}", collection);
                IndexStatus::Indexed
            }
            Err(e) => {
                warn!("写入向量集合 {} 失败: {}", collection, e);
                IndexStatus::Failed
            }
        }
    }

    /// 检索与 query 相似的历史对话（仅限同一用户、同一语言）
    pub async fn recall(
        &self,
        user_id: &str,
        language: Language,
        query: &str,
        limit: usize,
    ) -> ContextSearch {
        let Some(embedding) = &self.embedding else {
            return ContextSearch::empty();
        };

        let vector = match embedding.encode(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("生成查询 embedding 失败 (user: {}): {}", user_id, e);
                return ContextSearch::degraded();
            }
        };

        let collection = Self::collection_name(language);
        match self.index.search(&collection, &vector, user_id, limit).await {
            Ok(hits) => {
                if !hits.is_empty() {
                    debug!("找到 {} 条相似对话 (集合: {})", hits.len(), collection);
                }
                ContextSearch {
                    hits,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!("检索向量集合 {} 失败: {}", collection, e);
                ContextSearch::degraded()
            }
        }
    }
}

/// 创建语义记忆
pub fn create_semantic_memory(
    index: Box<dyn VectorIndex>,
    embedding: Option<Box<dyn EmbeddingModel>>,
) -> SemanticMemory {
    SemanticMemory::new(index, embedding)
}
