//! 服务模块

pub mod chat;

pub use chat::{ChatOutcome, ChatService, ChatServiceImpl, create_chat_service};
