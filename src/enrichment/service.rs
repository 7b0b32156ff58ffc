use std::sync::Arc;

use crate::cache::{EnrichmentCache, EnrichmentStore};
use crate::config::Config;

use super::aggregator::Aggregator;
use super::classifier::classify;
use super::error::LookupError;
use super::record::EnrichmentRecord;
use super::sources::{IpApiSource, NominatimGeocoder, RdapSource, build_http_client};

/// 富化服务入口
///
/// 同一 IP 的并发未命中可能各自聚合一次，后写入者覆盖先写入者。
#[derive(Clone)]
pub struct EnrichmentService {
    cache: EnrichmentCache,
    aggregator: Aggregator,
}

impl EnrichmentService {
    pub fn new(store: Arc<dyn EnrichmentStore>, aggregator: Aggregator) -> Self {
        Self {
            cache: EnrichmentCache::new(store),
            aggregator,
        }
    }

    /// 使用配置中的三个 HTTP 数据源构建服务
    pub fn from_config(
        config: &Config,
        store: Arc<dyn EnrichmentStore>,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let timeout = config.provider_timeout();

        let aggregator = Aggregator::new(
            Arc::new(IpApiSource::new(
                client.clone(),
                &config.network_source_url,
                timeout,
            )),
            Arc::new(RdapSource::new(
                client.clone(),
                &config.registration_source_url,
                timeout,
            )),
            Arc::new(NominatimGeocoder::new(
                client,
                &config.reverse_geocode_url,
                timeout,
            )),
        );

        Ok(Self::new(store, aggregator))
    }

    pub async fn lookup(&self, raw_ip: &str) -> Result<EnrichmentRecord, LookupError> {
        // 非法或内网地址直接拒绝，不访问缓存和网络
        let ip = classify(raw_ip).into_result()?;

        if let Some(record) = self.cache.get(&ip).await? {
            return Ok(record);
        }

        tracing::info!("Enriching {}", ip);
        let record = self.aggregator.enrich(&ip).await;
        self.cache.put(&record).await?;

        Ok(record)
    }
}
