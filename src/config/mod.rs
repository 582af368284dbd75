//! 配置模块

pub mod config;
pub mod loader;

pub use config::{
    AppConfig, ChatConfig, DatabaseConfig, EmbeddingConfig, LlmConfig, LoggingConfig,
    QdrantConfig, RedisConfig, ServerConfig,
};
pub use loader::{ConfigLoader, ConfigValidationError};
