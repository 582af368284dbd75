//! Handler 模块

pub mod chat_handler;
