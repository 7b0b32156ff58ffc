use std::sync::Arc;

use super::record::EnrichmentRecord;
use super::sources::{
    NetworkInfo, NetworkSource, RegistrationInfo, RegistrationSource, ReverseGeocoder,
    ReverseInfo, SourceError,
};

/// 吸收单个数据源的失败：记录日志并退化为空结果
fn settle<T: Default>(source: &'static str, ip: &str, outcome: Result<T, SourceError>) -> T {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(source, ip, error = %e, "Enrichment source unavailable");
            T::default()
        }
    }
}

/// 多数据源聚合器
///
/// 网络源与 WHOIS 源并发执行；反向地理编码依赖网络源的坐标，
/// 只有坐标可用时才会发起。任何数据源失败都不会让聚合失败。
#[derive(Clone)]
pub struct Aggregator {
    network: Arc<dyn NetworkSource>,
    registration: Arc<dyn RegistrationSource>,
    reverse: Arc<dyn ReverseGeocoder>,
}

impl Aggregator {
    pub fn new(
        network: Arc<dyn NetworkSource>,
        registration: Arc<dyn RegistrationSource>,
        reverse: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        Self {
            network,
            registration,
            reverse,
        }
    }

    /// 网络源完成后再决定是否反向地理编码
    async fn network_then_reverse(&self, ip: &str) -> (NetworkInfo, ReverseInfo) {
        let network = settle("network", ip, self.network.lookup(ip).await);

        let reverse = match network.coordinates() {
            Some((lat, lon)) => settle("reverse_geocode", ip, self.reverse.reverse(lat, lon).await),
            None => {
                tracing::debug!(ip, "No usable coordinates, skipping reverse geocoding");
                ReverseInfo::default()
            }
        };

        (network, reverse)
    }

    pub async fn enrich(&self, ip: &str) -> EnrichmentRecord {
        let ((network, reverse), registration) = tokio::join!(self.network_then_reverse(ip), async {
            settle("registration", ip, self.registration.lookup(ip).await)
        });

        merge(ip, network, registration, reverse)
    }
}

/// 各数据源拥有互不相交的字段，按字段合并即可
pub fn merge(
    ip: &str,
    network: NetworkInfo,
    registration: RegistrationInfo,
    reverse: ReverseInfo,
) -> EnrichmentRecord {
    let (latitude, longitude) = network.stored_coordinates();

    EnrichmentRecord {
        isp: network.isp,
        org: network.org,
        as_number: network.as_number,
        as_name: network.as_name,
        is_proxy: network.is_proxy,
        is_hosting: network.is_hosting,
        is_mobile: network.is_mobile,
        country: network.country,
        city: network.city,
        region: network.region,
        latitude,
        longitude,
        whois_org: registration.org,
        whois_address: registration.address,
        reverse_address: reverse.address,
        reverse_county: reverse.county,
        reverse_state: reverse.state,
        ..EnrichmentRecord::empty(ip)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 可编程的假数据源，记录调用次数
    #[derive(Default)]
    pub(crate) struct FakeSources {
        pub network: Option<NetworkInfo>,
        pub registration: Option<RegistrationInfo>,
        pub reverse: Option<ReverseInfo>,
        pub network_calls: AtomicUsize,
        pub registration_calls: AtomicUsize,
        pub reverse_calls: AtomicUsize,
    }

    impl FakeSources {
        pub(crate) fn total_calls(&self) -> usize {
            self.network_calls.load(Ordering::SeqCst)
                + self.registration_calls.load(Ordering::SeqCst)
                + self.reverse_calls.load(Ordering::SeqCst)
        }
    }

    fn outcome<T: Clone>(value: &Option<T>) -> Result<T, SourceError> {
        value
            .clone()
            .ok_or(SourceError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }

    #[async_trait]
    impl NetworkSource for FakeSources {
        async fn lookup(&self, _ip: &str) -> Result<NetworkInfo, SourceError> {
            self.network_calls.fetch_add(1, Ordering::SeqCst);
            outcome(&self.network)
        }
    }

    #[async_trait]
    impl RegistrationSource for FakeSources {
        async fn lookup(&self, _ip: &str) -> Result<RegistrationInfo, SourceError> {
            self.registration_calls.fetch_add(1, Ordering::SeqCst);
            outcome(&self.registration)
        }
    }

    #[async_trait]
    impl ReverseGeocoder for FakeSources {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<ReverseInfo, SourceError> {
            self.reverse_calls.fetch_add(1, Ordering::SeqCst);
            outcome(&self.reverse)
        }
    }

    pub(crate) fn aggregator(fakes: &Arc<FakeSources>) -> Aggregator {
        Aggregator::new(fakes.clone(), fakes.clone(), fakes.clone())
    }

    pub(crate) fn comcast_network() -> NetworkInfo {
        NetworkInfo {
            isp: "Comcast".into(),
            org: "Comcast Cable".into(),
            as_number: "AS7922".into(),
            as_name: "Comcast Cable Communications".into(),
            country: "United States".into(),
            city: "Philadelphia".into(),
            region: "Pennsylvania".into(),
            latitude: Some(39.9526),
            longitude: Some(-75.1652),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn merges_all_three_sources() {
        let fakes = Arc::new(FakeSources {
            network: Some(comcast_network()),
            registration: Some(RegistrationInfo {
                org: "Comcast Cable Communications".into(),
                address: "1800 Bishops Gate Blvd, Mount Laurel, NJ".into(),
            }),
            reverse: Some(ReverseInfo {
                address: "City Hall, Philadelphia".into(),
                county: "Philadelphia County".into(),
                state: "Pennsylvania".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let record = aggregator(&fakes).enrich("50.76.123.45").await;
        assert_eq!(record.ip, "50.76.123.45");
        assert_eq!(record.isp, "Comcast");
        assert_eq!(record.latitude, "39.9526");
        assert_eq!(record.longitude, "-75.1652");
        assert_eq!(record.whois_org, "Comcast Cable Communications");
        assert_eq!(record.reverse_county, "Philadelphia County");
        assert_eq!(fakes.reverse_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn network_failure_keeps_whois_fields() {
        let fakes = Arc::new(FakeSources {
            network: None,
            registration: Some(RegistrationInfo {
                org: "Level 3 Parent, LLC".into(),
                address: "100 CenturyLink Drive, Monroe, LA".into(),
            }),
            ..Default::default()
        });

        let record = aggregator(&fakes).enrich("4.4.4.4").await;
        assert_eq!(record.isp, "");
        assert_eq!(record.org, "");
        assert_eq!(record.as_number, "");
        assert!(!record.is_proxy && !record.is_hosting && !record.is_mobile);
        assert_eq!(record.whois_org, "Level 3 Parent, LLC");
        assert_eq!(record.whois_address, "100 CenturyLink Drive, Monroe, LA");
        // 没有坐标，不应调用反向地理编码
        assert_eq!(fakes.reverse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_coordinates_skip_reverse_geocoding() {
        let fakes = Arc::new(FakeSources {
            network: Some(NetworkInfo {
                isp: "Null Island Telecom".into(),
                latitude: Some(0.0),
                longitude: Some(0.0),
                ..Default::default()
            }),
            reverse: Some(ReverseInfo {
                address: "should not appear".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let record = aggregator(&fakes).enrich("1.0.0.1").await;
        assert_eq!(fakes.reverse_calls.load(Ordering::SeqCst), 0);
        assert_eq!(record.reverse_address, "");
        assert_eq!(record.latitude, "");
        assert_eq!(record.longitude, "");
        assert_eq!(record.isp, "Null Island Telecom");
    }

    #[tokio::test]
    async fn single_zero_axis_is_kept_but_not_reverse_geocoded() {
        let fakes = Arc::new(FakeSources {
            network: Some(NetworkInfo {
                latitude: Some(0.0),
                longitude: Some(32.5),
                ..Default::default()
            }),
            reverse: Some(ReverseInfo {
                address: "should not appear".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let record = aggregator(&fakes).enrich("41.0.0.1").await;
        assert_eq!(fakes.reverse_calls.load(Ordering::SeqCst), 0);
        assert_eq!(record.latitude, "0");
        assert_eq!(record.longitude, "32.5");
        assert_eq!(record.reverse_address, "");
    }

    #[tokio::test]
    async fn all_sources_failing_still_yields_a_record() {
        let fakes = Arc::new(FakeSources {
            network: Some(comcast_network()),
            ..Default::default()
        });

        let record = aggregator(&fakes).enrich("50.76.123.45").await;
        assert_eq!(fakes.reverse_calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.reverse_address, "");
        assert_eq!(record.whois_org, "");
        assert_eq!(record.city, "Philadelphia");

        let empty = Arc::new(FakeSources::default());
        let record = aggregator(&empty).enrich("9.9.9.9").await;
        assert_eq!(record.ip, "9.9.9.9");
        assert_eq!(record.isp, "");
    }
}
