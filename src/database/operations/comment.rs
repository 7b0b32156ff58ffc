use chrono::Utc;
use sqlx::{Error as SqlxError, PgPool};
use uuid::Uuid;

use crate::database::models::comment::CommentEntity;

/// 单篇文章最多返回的评论数
const MAX_COMMENTS_PER_POST: i64 = 200;

/// 评论数据库操作
pub struct CommentOperation;

impl CommentOperation {
    /// 按发布时间列出文章下的评论
    pub async fn list_by_slug(pool: &PgPool, slug: &str) -> Result<Vec<CommentEntity>, SqlxError> {
        sqlx::query_as::<_, CommentEntity>(
            r#"
            SELECT id, slug, author, body, created_at
            FROM comments
            WHERE slug = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(slug)
        .bind(MAX_COMMENTS_PER_POST)
        .fetch_all(pool)
        .await
    }

    /// 创建评论
    pub async fn create(
        pool: &PgPool,
        slug: &str,
        author: &str,
        body: &str,
    ) -> Result<CommentEntity, SqlxError> {
        let result = sqlx::query_as::<_, CommentEntity>(
            r#"
            INSERT INTO comments (id, slug, author, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, slug, author, body, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(author)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

        match result {
            Ok(comment) => {
                tracing::info!("Created comment {} on {}", comment.id, comment.slug);
                Ok(comment)
            }
            Err(e) => {
                tracing::error!("Failed to create comment: {:?}", e);
                Err(e)
            }
        }
    }
}
