use crate::observability::AppMetrics;
use crate::services::ChatService;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// 对话编排服务
    pub chat_service: Arc<dyn ChatService>,
    /// 应用指标
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("chat_service", &"Arc<dyn ChatService>")
            .field("metrics", &"Arc<AppMetrics>")
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(chat_service: Box<dyn ChatService>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            chat_service: Arc::from(chat_service),
            metrics,
        }
    }
}
