//! 向量索引服务
//!
//! 每种语言一个集合；集合的向量维度在创建时固定，由当前嵌入模型决定。

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::QdrantConfig;
use crate::error::{AppError, Result};

/// 语义记录的负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayload {
    /// 用户标识
    pub user_id: String,
    /// 关联的持久化对话 ID
    pub conversation_id: String,
    /// 用户消息
    pub user_message: String,
    /// 助手回复
    pub bot_response: String,
    /// 拼接后的完整文本（被嵌入的内容）
    pub text: String,
}

/// 相似度检索命中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    /// 命中的拼接文本
    pub text: String,
    /// 相似度分数（降序）
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// 确保集合存在（幂等，已存在不报错）
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    /// 写入一条语义记录
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        payload: RecordPayload,
    ) -> Result<()>;

    /// 按 user_id 过滤的相似度检索，按分数降序返回至多 limit 条
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>>;
}

struct MemoryCollection {
    dimension: usize,
    points: DashMap<String, (Vec<f32>, RecordPayload)>,
}

/// 内存向量索引（测试与单机开发用）
pub struct MemoryVectorIndex {
    collections: DashMap<String, MemoryCollection>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    /// 集合数量（测试用）
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    /// 指定集合的维度（测试用）
    pub fn collection_dimension(&self, collection: &str) -> Option<usize> {
        self.collections.get(collection).map(|c| c.dimension)
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        if let Some(existing) = self.collections.get(collection) {
            if existing.dimension != dimension {
                return Err(AppError::VectorIndex(format!(
                    "集合 {} 维度不匹配: 已有 {}, 请求 {}",
                    collection, existing.dimension, dimension
                )));
            }
            return Ok(());
        }

        self.collections.insert(
            collection.to_string(),
            MemoryCollection {
                dimension,
                points: DashMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        payload: RecordPayload,
    ) -> Result<()> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| AppError::VectorIndex(format!("集合不存在: {}", collection)))?;

        if vector.len() != entry.dimension {
            return Err(AppError::VectorIndex(format!(
                "向量维度不匹配: 集合 {} 期望 {}, 实际 {}",
                collection,
                entry.dimension,
                vector.len()
            )));
        }

        entry.points.insert(id.to_string(), (vector.to_vec(), payload));
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| AppError::VectorIndex(format!("集合不存在: {}", collection)))?;

        let mut hits: Vec<VectorHit> = entry
            .points
            .iter()
            .filter(|point| point.value().1.user_id == user_id)
            .map(|point| {
                let (stored_vector, payload) = point.value();
                VectorHit {
                    text: payload.text.clone(),
                    score: Self::cosine_similarity(vector, stored_vector),
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        Ok(hits)
    }
}

/// Qdrant REST 客户端
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    result: CollectionsResult,
}

#[derive(Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Option<RecordPayload>,
}

impl QdrantIndex {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn check_status(response: reqwest::Response, op: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorIndex(format!(
                "Qdrant {} 失败 ({}): {}",
                op, status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        // 先列出已有集合，存在则直接返回
        let response = self
            .client
            .get(format!("{}/collections", self.base_url))
            .send()
            .await?;
        let listing: CollectionsResponse =
            Self::check_status(response, "列出集合").await?.json().await?;

        if listing
            .result
            .collections
            .iter()
            .any(|c| c.name == collection)
        {
            return Ok(());
        }

        let response = self
            .client
            .put(format!("{}/collections/{}", self.base_url, collection))
            .json(&serde_json::json!({
                "vectors": { "size": dimension, "distance": "Cosine" }
            }))
            .send()
            .await?;
        Self::check_status(response, "创建集合").await?;

        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        payload: RecordPayload,
    ) -> Result<()> {
        let response = self
            .client
            .put(format!(
                "{}/collections/{}/points?wait=true",
                self.base_url, collection
            ))
            .json(&serde_json::json!({
                "points": [{ "id": id, "vector": vector, "payload": payload }]
            }))
            .send()
            .await?;
        Self::check_status(response, "写入点").await?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>> {
        let response = self
            .client
            .post(format!(
                "{}/collections/{}/points/search",
                self.base_url, collection
            ))
            .json(&serde_json::json!({
                "vector": vector,
                "limit": limit,
                "with_payload": true,
                "filter": {
                    "must": [{ "key": "user_id", "match": { "value": user_id } }]
                }
            }))
            .send()
            .await?;
        let search: SearchResponse = Self::check_status(response, "检索").await?.json().await?;

        Ok(search
            .result
            .into_iter()
            .filter_map(|point| {
                point.payload.map(|payload| VectorHit {
                    text: payload.text,
                    score: point.score,
                })
            })
            .collect())
    }
}

/// 按配置创建向量索引
pub fn create_vector_index(config: Option<&QdrantConfig>) -> Result<Box<dyn VectorIndex>> {
    match config {
        Some(qdrant) => Ok(Box::new(QdrantIndex::new(qdrant)?)),
        None => Ok(Box::new(MemoryVectorIndex::new())),
    }
}
