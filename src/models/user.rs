//! 用户模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户档案
///
/// 对话核心只读取该记录，用于生成系统提示词中的用户信息行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 用户唯一标识
    pub user_id: String,
    /// 姓名
    pub name: String,
    /// 年龄
    pub age: u32,
    /// 性别
    pub gender: String,
    /// 偏好语言代码
    pub preferred_language: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, age: u32, gender: &str, preferred_language: &str) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            preferred_language: preferred_language.to_string(),
            created_at: Utc::now(),
        }
    }
}
