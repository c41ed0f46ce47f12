//! レジストリ再読み込みの結合テスト

use std::io::{Seek, Write};
use std::sync::Arc;

use routegate::bootstrap::load_registry;
use routegate::flags::InMemoryFlagStore;
use routegate::registry::StaticRegistry;
use routegate::server::reload_registry;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::gateway::GatewayParts;
use crate::support::http::client;

fn write_registry(file: &mut tempfile::NamedTempFile, service: &str, primary: &str, secondary: &str) {
    let file = file.as_file_mut();
    file.set_len(0).unwrap();
    file.rewind().unwrap();
    write!(
        file,
        "{service}:\n  v1:\n    - {primary}\n    - {secondary}\n"
    )
    .unwrap();
    file.flush().unwrap();
}

#[tokio::test]
async fn reload_swaps_routes_for_running_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&upstream)
        .await;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write_registry(&mut file, "orders", &upstream.uri(), &upstream.uri());

    let registry = Arc::new(StaticRegistry::new(load_registry(Some(file.path())).unwrap()).unwrap());
    let gateway = GatewayParts::new(registry.clone(), Arc::new(InMemoryFlagStore::new()))
        .spawn()
        .await;

    let before = client().get(gateway.url("/billing/v1/x")).send().await.unwrap();
    assert_eq!(before.status(), 400);

    write_registry(&mut file, "billing", &upstream.uri(), &upstream.uri());
    assert!(reload_registry(&registry, Some(file.path())).unwrap());

    let after = client().get(gateway.url("/billing/v1/x")).send().await.unwrap();
    assert_eq!(after.status(), 200);
    let removed = client().get(gateway.url("/orders/v1/x")).send().await.unwrap();
    assert_eq!(removed.status(), 400);

    // 不正な内容では差し替えない
    write_registry(&mut file, "broken", "ftp://nope.local", &upstream.uri());
    assert!(reload_registry(&registry, Some(file.path())).is_err());
    let kept = client().get(gateway.url("/billing/v1/x")).send().await.unwrap();
    assert_eq!(kept.status(), 200);

    gateway.stop().await;
}
