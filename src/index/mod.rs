//! 索引模块
//!
//! 嵌入模型与向量索引两类后端，均以 trait 对上层提供统一接口。

pub mod embedding;
pub mod vector;

pub use embedding::{EmbeddingModel, create_embedding_model};
pub use vector::{RecordPayload, VectorHit, VectorIndex, create_vector_index};
