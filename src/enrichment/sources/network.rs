use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{NetworkInfo, NetworkSource, SourceError, clean, fetch_json};

const FIELDS: &str = "status,message,country,regionName,city,lat,lon,isp,org,as,mobile,proxy,hosting";

/// ip-api 风格的原始响应
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(rename = "as")]
    as_field: Option<String>,
    mobile: Option<bool>,
    proxy: Option<bool>,
    hosting: Option<bool>,
}

/// 将 "AS7922 Comcast Cable Communications" 拆成编号和名称
pub(crate) fn split_as(raw: &str) -> (String, String) {
    let raw = raw.trim();
    match raw.split_once(char::is_whitespace) {
        Some((number, name)) => (number.to_string(), name.trim().to_string()),
        None => (raw.to_string(), String::new()),
    }
}

impl IpApiResponse {
    fn into_info(self) -> Result<NetworkInfo, SourceError> {
        if self.status.as_deref() == Some("fail") {
            return Err(SourceError::LookupFailed(
                self.message.unwrap_or_else(|| "unknown".into()),
            ));
        }

        let (as_number, as_name) = split_as(self.as_field.as_deref().unwrap_or_default());
        Ok(NetworkInfo {
            isp: clean(self.isp),
            org: clean(self.org),
            as_number,
            as_name,
            is_proxy: self.proxy.unwrap_or(false),
            is_hosting: self.hosting.unwrap_or(false),
            is_mobile: self.mobile.unwrap_or(false),
            country: clean(self.country),
            city: clean(self.city),
            region: clean(self.region_name),
            latitude: self.lat,
            longitude: self.lon,
        })
    }
}

/// 网络 / ASN 数据源
pub struct IpApiSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl IpApiSource {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl NetworkSource for IpApiSource {
    async fn lookup(&self, ip: &str) -> Result<NetworkInfo, SourceError> {
        let request = self
            .client
            .get(format!("{}/{}", self.base_url, ip))
            .query(&[("fields", FIELDS)])
            .timeout(self.timeout);

        let raw: IpApiResponse = fetch_json(request).await?;
        raw.into_info()
    }
}
