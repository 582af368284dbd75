//! 嵌入模型服务

use async_trait::async_trait;
use reqwest;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{info, warn};

use crate::config::EmbeddingConfig;
use crate::error::{AppError, Result};

/// OpenAI text-embedding-3-small 的向量维度
pub const OPENAI_EMBEDDING_DIM: usize = 1536;
/// BGE-M3 的向量维度
pub const BGE_M3_DIM: usize = 1024;

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;
    fn dimension(&self) -> usize;
}

/// 确定性哈希嵌入模型
///
/// 把词哈希进固定数量的桶并归一化。没有语义，但相同文本产生相同
/// 向量、共享词越多相似度越高，足够支撑开发与测试。
pub struct SimpleEmbeddingModel {
    dimension: usize,
}

impl SimpleEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, word: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        (hasher.finish() as usize) % self.dimension
    }
}

#[async_trait]
impl EmbeddingModel for SimpleEmbeddingModel {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            vector[self.bucket(word)] += 1.0;
        }
        // 中文没有空格分词，再按字符补一遍特征
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            let mut buf = [0u8; 4];
            vector[self.bucket(ch.encode_utf8(&mut buf))] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut vector {
                *val /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Ollama Embedding 模型客户端（本地开源模型，默认 BGE-M3）
pub struct OllamaEmbeddingModel {
    client: reqwest::Client,
    model_name: String,
    base_url: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbeddingModel {
    pub fn new(base_url: &str, model_name: &str, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            model_name: model_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbeddingModel {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&serde_json::json!({
                "model": self.model_name,
                "input": [text],
                "truncate": true
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Ollama embedding failed: {}",
                error_text
            )));
        }

        let embed_response: OllamaEmbedResponse = response.json().await?;
        embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Ollama 返回了空的 embedding 列表".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// OpenAI Embedding API 客户端（托管付费服务）
pub struct OpenAiEmbeddingModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_name: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingModel {
    pub fn new(base_url: &str, api_key: &str, model_name: &str, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddingModel {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model_name,
                "input": text
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "OpenAI embedding failed: {}",
                error_text
            )));
        }

        let embed_response: OpenAiEmbedResponse = response.json().await?;
        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("OpenAI 返回了空的 embedding 列表".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// 按配置创建嵌入模型
///
/// 选择 "openai" 但未配置密钥时自动回退到本地 BGE-M3，而不是
/// 启动失败；"none" 表示关闭向量检索，返回 None。
pub fn create_embedding_model(config: &EmbeddingConfig) -> Result<Option<Box<dyn EmbeddingModel>>> {
    let mut backend = config.backend.as_str();

    if backend == "openai" && config.openai_api_key.is_empty() {
        warn!("未配置 OpenAI API 密钥，回退到本地 BGE-M3 模型");
        backend = "bge-m3";
    }

    match backend {
        "none" => {
            warn!("未配置 Embedding 后端，语义记忆将被跳过");
            Ok(None)
        }
        "openai" => {
            info!("使用 OpenAI Embeddings (维度: {})", OPENAI_EMBEDDING_DIM);
            let model = OpenAiEmbeddingModel::new(
                "https://api.openai.com/v1",
                &config.openai_api_key,
                "text-embedding-3-small",
                OPENAI_EMBEDDING_DIM,
            )?;
            Ok(Some(Box::new(model)))
        }
        "simple" => {
            info!("使用确定性哈希嵌入 (维度: {})", config.dimension);
            Ok(Some(Box::new(SimpleEmbeddingModel::new(config.dimension))))
        }
        _ => {
            info!(
                "使用本地模型 {} (维度: {})",
                config.model_name, BGE_M3_DIM
            );
            let model =
                OllamaEmbeddingModel::new(&config.ollama_url, &config.model_name, BGE_M3_DIM)?;
            Ok(Some(Box::new(model)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_simple_embedding_is_deterministic() {
        let model = SimpleEmbeddingModel::new(256);

        let a = model.encode("今天 天气 很好").await.unwrap();
        let b = model.encode("今天 天气 很好").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        assert!(a.iter().any(|v| *v > 0.0));
    }

    #[tokio::test]
    async fn test_simple_embedding_empty_text() {
        let model = SimpleEmbeddingModel::new(64);
        let vector = model.encode("").await.unwrap();
        assert_eq!(vector, vec![0.0; 64]);
    }

    #[tokio::test]
    async fn test_ollama_embedding_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2, 0.3]]
            })))
            .mount(&server)
            .await;

        let model = OllamaEmbeddingModel::new(&server.uri(), "bge-m3", 3).unwrap();
        let vector = model.encode("你好").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_openai_embedding_model_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let model = OpenAiEmbeddingModel::new(&server.uri(), "bad-key", "text-embedding-3-small", 1536)
            .unwrap();
        let err = model.encode("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[test]
    fn test_factory_falls_back_without_openai_key() {
        let config = EmbeddingConfig {
            backend: "openai".into(),
            openai_api_key: String::new(),
            ..EmbeddingConfig::default()
        };

        let model = create_embedding_model(&config).unwrap().unwrap();
        // 回退到本地模型，维度应为 BGE-M3 的 1024 而非 OpenAI 的 1536
        assert_eq!(model.dimension(), BGE_M3_DIM);
    }

    #[test]
    fn test_factory_none_backend() {
        let config = EmbeddingConfig {
            backend: "none".into(),
            ..EmbeddingConfig::default()
        };
        assert!(create_embedding_model(&config).unwrap().is_none());
    }
}
