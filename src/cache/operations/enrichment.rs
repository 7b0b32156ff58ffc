use std::sync::Arc;

use crate::cache::store::{EnrichmentStore, StoreError};
use crate::enrichment::EnrichmentRecord;

/// 富化结果缓存
///
/// 命中即返回，不设过期时间：记录一旦写入就视为权威数据。
#[derive(Clone)]
pub struct EnrichmentCache {
    store: Arc<dyn EnrichmentStore>,
}

impl EnrichmentCache {
    pub fn new(store: Arc<dyn EnrichmentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, ip: &str) -> Result<Option<EnrichmentRecord>, StoreError> {
        let cached = self.store.get_by_key(ip).await.map_err(|e| {
            tracing::error!("Failed to read enrichment cache for {}: {}", ip, e);
            e
        })?;

        if cached.is_some() {
            tracing::debug!("Enrichment cache hit: {}", ip);
        }
        Ok(cached)
    }

    pub async fn put(&self, record: &EnrichmentRecord) -> Result<(), StoreError> {
        self.store.upsert(record).await.map_err(|e| {
            tracing::error!("Failed to write enrichment cache for {}: {}", record.ip, e);
            e
        })
    }
}
