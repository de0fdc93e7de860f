//! Contract Test: Address echo service
//!
//! The mock server listens on IPv4 loopback, so only the IPv4 client is
//! exercised end to end.

use ddns_core::config::HostIpConfig;
use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::Error;
use ddns_ip_http::HttpAddressSource;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> HttpAddressSource {
    HttpAddressSource::new(&HostIpConfig {
        ipv4_url: format!("{}/ip", server.uri()),
        ipv6_url: format!("{}/ip", server.uri()),
    })
    .expect("source construction succeeds")
}

#[tokio::test]
async fn reads_plain_text_ipv4() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.23\n"))
        .expect(1)
        .mount(&server)
        .await;

    let addr = source_for(&server)
        .current_address(AddressFamily::V4)
        .await
        .unwrap();
    assert_eq!(addr, "198.51.100.23".parse::<std::net::IpAddr>().unwrap());
}

#[tokio::test]
async fn wrong_family_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ip":"2001:db8::1"}"#))
        .mount(&server)
        .await;

    let result = source_for(&server).current_address(AddressFamily::V4).await;
    assert!(matches!(result, Err(Error::AddressSource(_))));
}

#[tokio::test]
async fn http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = source_for(&server).current_address(AddressFamily::V4).await;
    match result {
        Err(Error::AddressSource(message)) => assert!(message.contains("503")),
        other => panic!("expected address source error, got {:?}", other),
    }
}
