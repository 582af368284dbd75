use serde::{Deserialize, Serialize};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 静态资源目录
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            static_dir: "static".into(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SurrealDB 连接地址
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000".into(),
            namespace: "nuanyang".into(),
            database: "companion".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Redis 配置（短期会话记忆）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis 连接地址
    pub url: String,
    /// 每个用户保留的最近轮数
    pub max_turns: usize,
    /// 会话过期时间（秒），每次写入刷新
    pub ttl_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".into(),
            max_turns: 10,
            ttl_secs: 3600,
        }
    }
}

/// Qdrant 配置（语义记忆）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// Qdrant REST 地址
    pub url: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".into(),
        }
    }
}

/// 嵌入模型配置
///
/// backend 可选值：
/// - "openai"：托管 Embedding API（需要密钥，维度 1536）
/// - "bge-m3"：本地开源模型，经由 Ollama 调用（维度 1024）
/// - "simple"：确定性哈希嵌入，用于开发和测试
/// - "none"：关闭向量检索（显式支持的降级模式）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding 后端类型
    pub backend: String,
    /// OpenAI API 密钥（backend = "openai" 时使用）
    pub openai_api_key: String,
    /// Ollama 服务器地址
    pub ollama_url: String,
    /// 本地模型名称
    pub model_name: String,
    /// simple 后端的向量维度
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "bge-m3".into(),
            openai_api_key: String::new(),
            ollama_url: "http://localhost:11434".into(),
            model_name: "bge-m3".into(),
            dimension: 1024,
        }
    }
}

/// 对话模型配置
///
/// 中文固定使用 DeepSeek；其余语言共用 OpenAI 模型，
/// 仅在配置了 openai_api_key 时初始化。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// DeepSeek API 密钥
    pub deepseek_api_key: String,
    /// DeepSeek API 地址
    pub deepseek_base_url: String,
    /// DeepSeek 模型名称
    pub deepseek_model: String,
    /// OpenAI API 密钥（可选，仅荷兰语/英语需要）
    pub openai_api_key: String,
    /// OpenAI API 地址
    pub openai_base_url: String,
    /// OpenAI 模型名称
    pub openai_model: String,
    /// 采样温度
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            deepseek_api_key: String::new(),
            deepseek_base_url: "https://api.deepseek.com/v1".into(),
            deepseek_model: "deepseek-chat".into(),
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".into(),
            openai_model: "gpt-4o-mini".into(),
            temperature: 0.7,
        }
    }
}

/// 对话编排配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// 默认语言代码
    pub default_language: String,
    /// 语义检索返回的相似对话条数
    pub context_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_language: "zh".into(),
            context_limit: 2,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// Redis 配置
    pub redis: RedisConfig,
    /// Qdrant 配置
    pub qdrant: QdrantConfig,
    /// 嵌入模型配置
    pub embedding: EmbeddingConfig,
    /// 对话模型配置
    pub llm: LlmConfig,
    /// 对话编排配置
    pub chat: ChatConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            embedding: EmbeddingConfig {
                backend: "simple".into(),
                ..EmbeddingConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".into(),
            },
            app_name: "nuanyang".into(),
            environment: "development".into(),
            ..Self::default()
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.embedding.backend = "bge-m3".into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.chat.default_language, "zh");
        assert_eq!(config.redis.max_turns, 10);
        assert_eq!(config.redis.ttl_secs, 3600);
        assert_eq!(config.chat.context_limit, 2);
        assert_eq!(config.embedding.backend, "simple");
    }
}
