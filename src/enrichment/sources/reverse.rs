use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ReverseGeocoder, ReverseInfo, SourceError, clean, fetch_json, join_non_empty};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

/// Nominatim 风格的原始响应
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
    error: Option<String>,
}

impl NominatimResponse {
    fn into_info(self) -> Result<ReverseInfo, SourceError> {
        if let Some(error) = self.error {
            return Err(SourceError::LookupFailed(error));
        }

        let address = self.address.unwrap_or_default();
        let city = clean(address.city.or(address.town).or(address.village));
        let state = clean(address.state);
        let postcode = clean(address.postcode);
        let country = clean(address.country);

        let display = clean(self.display_name);
        let full = if display.is_empty() {
            join_non_empty([
                city.as_str(),
                state.as_str(),
                postcode.as_str(),
                country.as_str(),
            ])
        } else {
            display
        };

        Ok(ReverseInfo {
            address: full,
            city,
            county: clean(address.county),
            state,
            postcode,
            country,
        })
    }
}

/// 反向地理编码数据源
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReverseInfo, SourceError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .timeout(self.timeout);

        let raw: NominatimResponse = fetch_json(request).await?;
        raw.into_info()
    }
}
