// 数据库模块
// 包含数据库实体定义和操作实现

pub mod models; // 数据库实体定义
pub mod operations; // 数据库操作实现

use sqlx::PgPool;
use sqlx::migrate::MigrateError;

// 重新导出常用类型
pub use models::comment::CommentEntity;
pub use operations::comment::CommentOperation;
pub use operations::enrichment::PgEnrichmentStore;

/// 执行内嵌的数据库迁移，建立本服务拥有的两张表
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
