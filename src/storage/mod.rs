//! 存储模块
//!
//! 用户档案与完整对话历史的持久化。

pub mod repository;
pub mod surrealdb;

pub use repository::{
    ConversationRepository, SurrealConversationRepository, SurrealUserRepository, UserRepository,
};
pub use surrealdb::SurrealPool;
