//! 路由模块

pub mod chat_routes;
