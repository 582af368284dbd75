//! 可观测性模块
//!
//! 提供简单指标和健康检查。

use axum::{Json, Router, response::IntoResponse, routing::get};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// ===== Simple Metrics (using atomics for zero-dep implementation) =====

/// 简单应用指标
#[derive(Clone, Default)]
pub struct AppMetrics {
    pub http_requests_total: Arc<AtomicU64>,
    pub chat_turns_total: Arc<AtomicU64>,
    pub degraded_turns_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self) {
        self.http_requests_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录一轮对话
    pub fn record_chat_turn(&self, degraded: bool) {
        self.chat_turns_total.fetch_add(1, Ordering::SeqCst);
        if degraded {
            self.degraded_turns_total.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP chat_turns_total Total chat turns
# TYPE chat_turns_total counter
chat_turns_total {}
# HELP degraded_turns_total Chat turns that hit a degraded path
# TYPE degraded_turns_total counter
degraded_turns_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
"#,
            self.http_requests_total.load(Ordering::SeqCst),
            self.chat_turns_total.load(Ordering::SeqCst),
            self.degraded_turns_total.load(Ordering::SeqCst),
            self.errors_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
}

/// 应用状态（用于健康检查）
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String) -> Self {
        Self {
            metrics: Arc::new(AppMetrics::default()),
            start_time: Utc::now(),
            version,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

/// 获取健康状态
pub async fn health_check(
    state: axum::extract::State<Arc<ObservabilityState>>,
) -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// 获取 Prometheus 指标
pub async fn metrics(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    state.metrics.gather()
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}
