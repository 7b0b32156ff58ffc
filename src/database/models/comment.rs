use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 评论数据库实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntity {
    pub id: Uuid,
    /// 文章标识
    pub slug: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
