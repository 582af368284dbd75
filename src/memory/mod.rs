//! 记忆模块
//!
//! 短期记忆：按用户保存最近若干轮对话，带滑动过期。
//! 语义记忆：按语言分集合的向量索引，支持按用户过滤的相似度检索。
//!
//! 两类存储的后端故障都会被降级为空结果或空操作，并以显式的
//! 结果类型（而不是吞掉的异常）告知编排器，方便测试断言降级路径。

pub mod semantic;
pub mod short_term;

/// 检索命中（text + score）
pub type ContextHit = crate::index::VectorHit;

pub use semantic::{ContextSearch, IndexStatus, SemanticMemory, create_semantic_memory};
pub use short_term::{
    AppendStatus, CacheStore, HistoryRead, MemoryStore, RedisStore, ShortTermMemory,
    create_short_term_memory,
};
