//! DTO 模块

pub mod chat_dto;
