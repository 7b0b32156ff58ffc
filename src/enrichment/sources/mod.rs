//! 第三方数据源适配层
//!
//! 每个数据源都有自己的原始响应类型，字段提取在适配层完成，
//! 上层只看到规范化后的 `NetworkInfo` / `RegistrationInfo` / `ReverseInfo`。

mod network;
mod registration;
mod reverse;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;

pub use network::IpApiSource;
pub use registration::RdapSource;
pub use reverse::NominatimGeocoder;

/// 单个数据源的失败，只在聚合器内部记录日志，不会返回给调用方
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("provider reported failure: {0}")]
    LookupFailed(String),
}

/// 网络 / ASN 信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInfo {
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
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NetworkInfo {
    /// 可用于反向地理编码的坐标；任一分量缺失或为 0 都视为无数据
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon))
                if lat.is_finite() && lon.is_finite() && lat != 0.0 && lon != 0.0 =>
            {
                Some((lat, lon))
            }
            _ => None,
        }
    }

    /// 写入记录的经纬度；只有缺失或恰好为 (0,0) 时置空，各分量单独取值
    pub fn stored_coordinates(&self) -> (String, String) {
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            if lat == 0.0 && lon == 0.0 {
                return (String::new(), String::new());
            }
        }
        let axis = |value: Option<f64>| match value {
            Some(v) if v.is_finite() => v.to_string(),
            _ => String::new(),
        };
        (axis(self.latitude), axis(self.longitude))
    }
}

/// WHOIS 注册信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub org: String,
    pub address: String,
}

/// 反向地理编码结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseInfo {
    pub address: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}

#[async_trait]
pub trait NetworkSource: Send + Sync {
    async fn lookup(&self, ip: &str) -> Result<NetworkInfo, SourceError>;
}

#[async_trait]
pub trait RegistrationSource: Send + Sync {
    async fn lookup(&self, ip: &str) -> Result<RegistrationInfo, SourceError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReverseInfo, SourceError>;
}

/// 构建所有数据源共用的 HTTP 客户端
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.provider_user_agent.clone())
        .connect_timeout(config.provider_timeout())
        .build()
}

/// 发送请求并解析 JSON，非 2xx 视为失败
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status));
    }
    Ok(response.json::<T>().await?)
}

/// 去掉首尾空白，空值返回空字符串
pub(crate) fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// 拼接非空片段
pub(crate) fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
