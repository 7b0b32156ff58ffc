use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 单个 IP 的富化记录，对应 ip_enrichment 表
///
/// 不可用的字段一律以空字符串表示，布尔标志默认为 false。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    pub ip: String,
    pub isp: String,
    pub org: String,
    pub as_number: String,
    pub as_name: String,
    pub is_proxy: bool,
    pub is_hosting: bool,
    pub is_mobile: bool,
    pub country: String,
    pub city: String,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
    pub whois_org: String,
    pub whois_address: String,
    pub reverse_address: String,
    pub reverse_county: String,
    pub reverse_state: String,
    pub cached_at: DateTime<Utc>,
}

impl EnrichmentRecord {
    /// 创建一条只有地址的空记录
    pub fn empty(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            isp: String::new(),
            org: String::new(),
            as_number: String::new(),
            as_name: String::new(),
            is_proxy: false,
            is_hosting: false,
            is_mobile: false,
            country: String::new(),
            city: String::new(),
            region: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            whois_org: String::new(),
            whois_address: String::new(),
            reverse_address: String::new(),
            reverse_county: String::new(),
            reverse_state: String::new(),
            // Postgres timestamptz 只有微秒精度，截断后写入与读回一致
            cached_at: Utc::now().trunc_subsecs(6),
        }
    }
}
