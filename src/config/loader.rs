use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. ./config.toml
    /// 2. 环境变量（NUANYANG_ 前缀，双下划线分隔层级）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("NUANYANG_").split("__"));

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("NUANYANG_").split("__"));

        figment.extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if crate::language::Language::parse(&config.chat.default_language).is_none() {
            return Err(ConfigValidationError::UnsupportedDefaultLanguage(
                config.chat.default_language.clone(),
            ));
        }

        match config.embedding.backend.as_str() {
            "openai" | "bge-m3" | "simple" | "none" => {}
            other => {
                return Err(ConfigValidationError::UnknownEmbeddingBackend(
                    other.to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("数据库连接 URL 未配置")]
    MissingDatabaseUrl,

    #[error("默认语言不受支持: {0}")]
    UnsupportedDefaultLanguage(String),

    #[error("未知的 Embedding 后端: {0}")]
    UnknownEmbeddingBackend(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        let config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_embedding_backend() {
        let mut config = AppConfig::development();
        config.embedding.backend = "word2vec".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnknownEmbeddingBackend(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unsupported_default_language() {
        let mut config = AppConfig::development();
        config.chat.default_language = "fr".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnsupportedDefaultLanguage(_))
        ));
    }
}
