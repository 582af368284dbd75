//! 暖洋洋 - 老年人智能陪伴对话服务
//!
//! 将聊天消息路由到语言对应的大模型后端，通过检索增强（RAG）注入
//! 历史相似对话，并把每轮对话同时写入短期记忆与向量索引。

pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod language;
pub mod llm;
pub mod memory;
pub mod models;
pub mod observability;
pub mod prompts;
pub mod services;
pub mod storage;
