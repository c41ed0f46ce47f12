//! 上流障害時のステータス変換

use std::sync::Arc;
use std::time::Duration;

use routegate::config::UpstreamConfig;
use routegate::flags::InMemoryFlagStore;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::gateway::{two_way_registry, GatewayParts};
use crate::support::http::{client, closed_addr};

#[tokio::test]
async fn refused_connection_is_bad_gateway() {
    let dead = format!("http://{}", closed_addr());
    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &dead, &dead),
        Arc::new(InMemoryFlagStore::new()),
    )
    .spawn()
    .await;

    let response = client().get(gateway.url("/svc/v1/x")).send().await.unwrap();
    assert_eq!(response.status(), 502);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"]["statusType"], "ERROR");
    assert_eq!(json["status"]["statusMessage"], "upstream unreachable");
    gateway.stop().await;
}

#[tokio::test]
async fn slow_upstream_is_gateway_timeout() {
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&slow)
        .await;

    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &slow.uri(), &slow.uri()),
        Arc::new(InMemoryFlagStore::new()),
    )
    .upstream(UpstreamConfig {
        timeout: Duration::from_millis(300),
        ..UpstreamConfig::default()
    })
    .spawn()
    .await;

    let response = client().get(gateway.url("/svc/v1/x")).send().await.unwrap();
    assert_eq!(response.status(), 504);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"]["statusMessage"], "upstream timeout");
    gateway.stop().await;
}

#[tokio::test]
async fn concurrent_requests_share_the_pool() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&upstream)
        .await;

    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &upstream.uri(), &upstream.uri()),
        Arc::new(InMemoryFlagStore::new()),
    )
    .upstream(UpstreamConfig {
        max_conns_per_host: 2,
        ..UpstreamConfig::default()
    })
    .spawn()
    .await;

    let client = client();
    let url = gateway.url("/svc/v1/x");
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move { client.get(url).send().await.unwrap().status() })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), 200);
    }
    assert_eq!(upstream.received_requests().await.unwrap().len(), 16);
    gateway.stop().await;
}

#[tokio::test]
async fn slot_wait_counts_against_the_upstream_timeout() {
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
        .mount(&slow)
        .await;

    // 1接続しか持てないので、2本目は1本目の完了（約400ms）を待つ
    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &slow.uri(), &slow.uri()),
        Arc::new(InMemoryFlagStore::new()),
    )
    .upstream(UpstreamConfig {
        timeout: Duration::from_millis(600),
        max_conns_per_host: 1,
        ..UpstreamConfig::default()
    })
    .spawn()
    .await;

    let client = client();
    let url = gateway.url("/svc/v1/x");
    let first = tokio::spawn({
        let client = client.clone();
        let url = url.clone();
        async move { client.get(url).send().await.unwrap().status() }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = client.get(&url).send().await.unwrap();

    assert_eq!(first.await.unwrap(), 200);
    // 待ち時間を差し引いた残り（約200ms）では400msの上流に間に合わない
    assert_eq!(second.status(), 504);
    gateway.stop().await;
}
