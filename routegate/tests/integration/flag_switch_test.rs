//! フラグによる切り替えの結合テスト（RESPストア経由）

use std::sync::Arc;
use std::time::Duration;

use routegate::config::FlagStoreConfig;
use routegate::common::error::GatewayError;
use routegate::flags::{FlagStore, RedisFlagStore};
use routegate::switch::FlagFallback;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::flag_store::FakeFlagStore;
use crate::support::gateway::{two_way_registry, GatewayParts};
use crate::support::http::{client, closed_addr};

fn redis_store(addr: String) -> Arc<RedisFlagStore> {
    Arc::new(
        RedisFlagStore::new(FlagStoreConfig {
            addr,
            timeout: Duration::from_millis(200),
        })
        .unwrap(),
    )
}

async fn labelled(label: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(label))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn redis_store_reads_values() {
    let fake = FakeFlagStore::start().await;
    fake.set("on", "true");
    fake.set("one", "1");
    fake.set("off", "false");
    fake.set("yes", "yes");
    let store = redis_store(fake.addr());

    store.ping().await.unwrap();
    assert!(store.get_flag("on").await.unwrap());
    assert!(store.get_flag("one").await.unwrap());
    assert!(!store.get_flag("off").await.unwrap());
    // ParseBool非対応の値はfalse
    assert!(!store.get_flag("yes").await.unwrap());
    // キーなしはfalse（エラーではない）
    assert!(!store.get_flag("missing").await.unwrap());
}

#[tokio::test]
async fn redis_store_reuses_connections() {
    let fake = FakeFlagStore::start().await;
    fake.set("v1", "true");
    let store = redis_store(fake.addr());

    for _ in 0..5 {
        assert!(store.get_flag("v1").await.unwrap());
    }
    assert_eq!(fake.connections(), 1);
}

#[tokio::test]
async fn redis_store_error_reply_is_unavailable() {
    let fake = FakeFlagStore::start().await;
    fake.fail_with_error(true);
    let store = redis_store(fake.addr());

    assert!(store.ping().await.is_err());
    assert!(store.get_flag("v1").await.is_err());
}

#[tokio::test]
async fn redis_store_oversized_bulk_reply_is_unavailable() {
    let fake = FakeFlagStore::start().await;
    fake.reply_to_get_with("$9223372036854775807\r\n");
    let store = redis_store(fake.addr());

    // panicせず、フォールバック可能なエラーになる
    let result = tokio::spawn({
        let store = store.clone();
        async move { store.get_flag("Key").await }
    })
    .await
    .expect("flag read must not panic");
    assert!(matches!(result, Err(GatewayError::FlagStoreUnavailable(_))));
}

#[tokio::test]
async fn redis_store_garbage_reply_is_unavailable() {
    let fake = FakeFlagStore::start().await;
    fake.reply_to_get_with("?what\r\n");
    let store = redis_store(fake.addr());

    assert!(matches!(
        store.get_flag("Key").await,
        Err(GatewayError::FlagStoreUnavailable(_))
    ));
}

#[tokio::test]
async fn flag_change_switches_endpoint_between_requests() {
    let primary = labelled("primary").await;
    let secondary = labelled("secondary").await;
    let fake = FakeFlagStore::start().await;
    fake.set("v1", "true");

    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &primary.uri(), &secondary.uri()),
        redis_store(fake.addr()),
    )
    .spawn()
    .await;

    let url = gateway.url("/svc/v1/ping");
    let body = |r: reqwest::Response| async move { r.text().await.unwrap() };

    assert_eq!(body(client().get(&url).send().await.unwrap()).await, "primary");
    fake.set("v1", "false");
    assert_eq!(body(client().get(&url).send().await.unwrap()).await, "secondary");
    fake.remove("v1");
    assert_eq!(body(client().get(&url).send().await.unwrap()).await, "secondary");
    fake.set("v1", "T");
    assert_eq!(body(client().get(&url).send().await.unwrap()).await, "primary");

    gateway.stop().await;
}

#[tokio::test]
async fn unreachable_store_uses_secondary_by_default() {
    let primary = labelled("primary").await;
    let secondary = labelled("secondary").await;

    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &primary.uri(), &secondary.uri()),
        redis_store(closed_addr().to_string()),
    )
    .spawn()
    .await;

    let response = client().get(gateway.url("/svc/v1/x")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "secondary");
    gateway.stop().await;
}

#[tokio::test]
async fn unreachable_store_with_primary_fallback() {
    let primary = labelled("primary").await;
    let secondary = labelled("secondary").await;

    let gateway = GatewayParts::new(
        two_way_registry("svc", "v1", &primary.uri(), &secondary.uri()),
        redis_store(closed_addr().to_string()),
    )
    .fallback(FlagFallback::Primary)
    .spawn()
    .await;

    let response = client().get(gateway.url("/svc/v1/x")).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "primary");
    gateway.stop().await;
}
