use crate::config::DatabaseConfig;
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;

/// SurrealDB 连接池
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Arc<Mutex<Option<Surreal<Any>>>>,
}

impl SurrealPool {
    /// 创建新的连接池
    ///
    /// username 为空时跳过认证（本地内存引擎没有认证）。
    pub async fn new(config: &DatabaseConfig) -> Result<Self, surrealdb::Error> {
        let db: Surreal<Any> = connect(&config.url).await?;

        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
        })
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Surreal<Any> {
        let guard = self.db.lock().await;
        guard.as_ref().expect("Database connection closed").clone()
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}
