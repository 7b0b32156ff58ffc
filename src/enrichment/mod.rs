//! IP 情报富化
//!
//! 分类器 → 缓存 → 多源聚合 → 缓存写入。

pub mod aggregator;
pub mod classifier;
mod error;
pub mod record;
pub mod service;
pub mod sources;

pub use aggregator::Aggregator;
pub use classifier::{Classification, classify};
pub use error::LookupError;
pub use record::EnrichmentRecord;
pub use service::EnrichmentService;
