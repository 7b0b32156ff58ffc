//! 针对三个 HTTP 数据源的集成测试，第三方服务由 wiremock 模拟

use std::sync::Arc;
use std::time::{Duration, Instant};

use ipintel::cache::MemoryEnrichmentStore;
use ipintel::config::Config;
use ipintel::enrichment::{EnrichmentService, LookupError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        network_source_url: format!("{}/json", server.uri()),
        registration_source_url: format!("{}/rdap/ip", server.uri()),
        reverse_geocode_url: format!("{}/reverse", server.uri()),
        provider_timeout_secs: 1,
        ..Config::default()
    }
}

fn service(server: &MockServer) -> (EnrichmentService, Arc<MemoryEnrichmentStore>) {
    let store = Arc::new(MemoryEnrichmentStore::new());
    let service = EnrichmentService::from_config(&test_config(server), store.clone())
        .expect("client should build");
    (service, store)
}

fn comcast_network_body() -> serde_json::Value {
    json!({
        "status": "success",
        "country": "United States",
        "regionName": "Pennsylvania",
        "city": "Philadelphia",
        "lat": 39.9526,
        "lon": -75.1652,
        "isp": "Comcast",
        "org": "Comcast Cable Communications, LLC",
        "as": "AS7922 Comcast Cable Communications",
        "mobile": false,
        "proxy": false,
        "hosting": false
    })
}

fn comcast_rdap_body() -> serde_json::Value {
    json!({
        "name": "COMCAST-50",
        "entities": [{
            "roles": ["registrant"],
            "vcardArray": ["vcard", [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", "Comcast Cable Communications"],
                ["adr", {"label": "1800 Bishops Gate Blvd\nMount Laurel\nNJ\n08054\nUnited States"}, "text", ["", "", "", "", "", "", ""]],
                ["kind", {}, "text", "org"]
            ]]
        }]
    })
}

#[tokio::test]
async fn comcast_lookup_merges_all_sources() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/50.76.123.45"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comcast_network_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rdap/ip/50.76.123.45"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comcast_rdap_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "39.9526"))
        .and(query_param("lon", "-75.1652"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "City Hall, Philadelphia, Philadelphia County, Pennsylvania, 19107, United States",
            "address": {
                "city": "Philadelphia",
                "county": "Philadelphia County",
                "state": "Pennsylvania",
                "postcode": "19107",
                "country": "United States"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, store) = service(&server);
    let record = service.lookup("50.76.123.45").await.unwrap();

    assert_eq!(record.ip, "50.76.123.45");
    assert_eq!(record.isp, "Comcast");
    assert_eq!(record.as_number, "AS7922");
    assert_eq!(record.as_name, "Comcast Cable Communications");
    assert_eq!(record.whois_org, "Comcast Cable Communications");
    assert_eq!(
        record.whois_address,
        "1800 Bishops Gate Blvd, Mount Laurel, NJ, 08054, United States"
    );
    assert_eq!(record.latitude, "39.9526");
    assert_eq!(record.reverse_county, "Philadelphia County");
    assert_eq!(record.reverse_state, "Pennsylvania");
    assert_eq!(store.writes(), 1);

    // 第二次查询完全命中缓存，mock 的 expect(1) 会在 drop 时校验
    let again = service.lookup("50.76.123.45").await.unwrap();
    assert_eq!(
        serde_json::to_string(&record).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn failed_network_source_keeps_registration_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/50.76.123.45"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rdap/ip/50.76.123.45"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comcast_rdap_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, _store) = service(&server);
    let record = service.lookup("50.76.123.45").await.unwrap();

    assert_eq!(record.isp, "");
    assert_eq!(record.org, "");
    assert_eq!(record.as_number, "");
    assert_eq!(record.whois_org, "Comcast Cable Communications");
    assert!(!record.whois_address.is_empty());
}

#[tokio::test]
async fn provider_fail_status_and_zero_coordinates_skip_reverse_geocoding() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/1.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "isp": "APNIC Research",
            "lat": 0,
            "lon": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json/1.0.0.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "quota exceeded",
            "isp": "ignored"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"display_name": "nowhere"})))
        .expect(0)
        .mount(&server)
        .await;
    // RDAP 全部返回 404
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (service, _store) = service(&server);

    let record = service.lookup("1.0.0.1").await.unwrap();
    assert_eq!(record.isp, "APNIC Research");
    assert_eq!(record.latitude, "");
    assert_eq!(record.longitude, "");
    assert_eq!(record.reverse_address, "");
    assert_eq!(record.whois_org, "");

    let record = service.lookup("1.0.0.2").await.unwrap();
    assert_eq!(record.isp, "");
    assert_eq!(record.reverse_address, "");
}

#[tokio::test]
async fn hung_provider_is_bounded_by_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/9.9.9.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(comcast_network_body())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rdap/ip/9.9.9.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "QUAD9"})))
        .mount(&server)
        .await;

    let (service, _store) = service(&server);
    let started = Instant::now();
    let record = service.lookup("9.9.9.9").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(record.isp, "");
    assert_eq!(record.whois_org, "QUAD9");
}

#[tokio::test]
async fn rejected_addresses_never_reach_providers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (service, store) = service(&server);
    assert_eq!(service.lookup("192.168.1.20").await, Err(LookupError::PrivateAddress));
    assert_eq!(service.lookup("fe80::1ff:fe23:4567:890a").await, Err(LookupError::PrivateAddress));
    assert_eq!(service.lookup("not-an-ip!").await, Err(LookupError::InvalidFormat));
    assert_eq!(store.reads(), 0);
}
