// 缓存模块
// 富化结果缓存（关系库为后端）与限流计数（Redis）

pub mod keys;
pub mod models;
pub mod operations;
pub mod store;

// 重新导出常用类型
pub use operations::enrichment::EnrichmentCache;
pub use operations::rate_limit::RateLimitCacheOperations;
pub use store::{EnrichmentStore, MemoryEnrichmentStore, StoreError};
