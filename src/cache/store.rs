use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::enrichment::EnrichmentRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 富化缓存所需的键值持久化接口，只要求按键读取与 upsert
#[async_trait]
pub trait EnrichmentStore: Send + Sync {
    async fn get_by_key(&self, ip: &str) -> Result<Option<EnrichmentRecord>, StoreError>;

    /// 同一 ip 再次写入时覆盖旧记录
    async fn upsert(&self, record: &EnrichmentRecord) -> Result<(), StoreError>;
}

/// 进程内存储，用于本地运行与测试
#[derive(Default)]
pub struct MemoryEnrichmentStore {
    records: RwLock<HashMap<String, EnrichmentRecord>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryEnrichmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// 累计读取次数
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// 累计写入次数
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentStore for MemoryEnrichmentStore {
    async fn get_by_key(&self, ip: &str) -> Result<Option<EnrichmentRecord>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.read().get(ip).cloned())
    }

    async fn upsert(&self, record: &EnrichmentRecord) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .write()
            .insert(record.ip.clone(), record.clone());
        Ok(())
    }
}
