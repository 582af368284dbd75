//! 数据模型模块

pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::ConversationRecord;
pub use message::{ChatTurn, Role};
pub use user::User;
