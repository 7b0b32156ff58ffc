// 缓存操作
pub mod enrichment;
pub mod rate_limit;

pub use enrichment::EnrichmentCache;
pub use rate_limit::RateLimitCacheOperations;
