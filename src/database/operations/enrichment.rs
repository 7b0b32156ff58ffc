use async_trait::async_trait;
use sqlx::PgPool;

use crate::cache::{EnrichmentStore, StoreError};
use crate::enrichment::EnrichmentRecord;

/// ip_enrichment 表上的富化缓存
#[derive(Clone)]
pub struct PgEnrichmentStore {
    pool: PgPool,
}

impl PgEnrichmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrichmentStore for PgEnrichmentStore {
    async fn get_by_key(&self, ip: &str) -> Result<Option<EnrichmentRecord>, StoreError> {
        let record = sqlx::query_as::<_, EnrichmentRecord>(
            r#"
            SELECT ip, isp, org, as_number, as_name, is_proxy, is_hosting, is_mobile,
                   country, city, region, latitude, longitude,
                   whois_org, whois_address,
                   reverse_address, reverse_county, reverse_state,
                   cached_at
            FROM ip_enrichment
            WHERE ip = $1
            "#,
        )
        .bind(ip)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(&self, record: &EnrichmentRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ip_enrichment (
                ip, isp, org, as_number, as_name, is_proxy, is_hosting, is_mobile,
                country, city, region, latitude, longitude,
                whois_org, whois_address,
                reverse_address, reverse_county, reverse_state,
                cached_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (ip) DO UPDATE SET
                isp = EXCLUDED.isp,
                org = EXCLUDED.org,
                as_number = EXCLUDED.as_number,
                as_name = EXCLUDED.as_name,
                is_proxy = EXCLUDED.is_proxy,
                is_hosting = EXCLUDED.is_hosting,
                is_mobile = EXCLUDED.is_mobile,
                country = EXCLUDED.country,
                city = EXCLUDED.city,
                region = EXCLUDED.region,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                whois_org = EXCLUDED.whois_org,
                whois_address = EXCLUDED.whois_address,
                reverse_address = EXCLUDED.reverse_address,
                reverse_county = EXCLUDED.reverse_county,
                reverse_state = EXCLUDED.reverse_state,
                cached_at = EXCLUDED.cached_at
            "#,
        )
        .bind(&record.ip)
        .bind(&record.isp)
        .bind(&record.org)
        .bind(&record.as_number)
        .bind(&record.as_name)
        .bind(record.is_proxy)
        .bind(record.is_hosting)
        .bind(record.is_mobile)
        .bind(&record.country)
        .bind(&record.city)
        .bind(&record.region)
        .bind(&record.latitude)
        .bind(&record.longitude)
        .bind(&record.whois_org)
        .bind(&record.whois_address)
        .bind(&record.reverse_address)
        .bind(&record.reverse_county)
        .bind(&record.reverse_state)
        .bind(record.cached_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored enrichment for {}", record.ip);
        Ok(())
    }
}
