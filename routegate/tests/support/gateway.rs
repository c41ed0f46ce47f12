use std::sync::Arc;

use routegate::api::{create_app, AppOptions};
use routegate::bootstrap::assemble;
use routegate::config::UpstreamConfig;
use routegate::flags::FlagStore;
use routegate::registry::{RegistrySnapshot, StaticRegistry};
use routegate::switch::FlagFallback;

use super::http::{spawn_server, TestServer};

/// 2エンドポイントのルートを1つ持つレジストリ
pub fn two_way_registry(service: &str, version: &str, primary: &str, secondary: &str) -> Arc<StaticRegistry> {
    Arc::new(
        StaticRegistry::new(RegistrySnapshot::new().with_route(
            service,
            version,
            [primary, secondary],
        ))
        .unwrap(),
    )
}

/// ゲートウェイの構成要素
pub struct GatewayParts {
    pub registry: Arc<StaticRegistry>,
    pub flags: Arc<dyn FlagStore>,
    pub fallback: FlagFallback,
    pub upstream: UpstreamConfig,
}

#[allow(dead_code)]
impl GatewayParts {
    pub fn new(registry: Arc<StaticRegistry>, flags: Arc<dyn FlagStore>) -> Self {
        Self {
            registry,
            flags,
            fallback: FlagFallback::Secondary,
            upstream: UpstreamConfig::default(),
        }
    }

    pub fn fallback(mut self, fallback: FlagFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = upstream;
        self
    }

    /// ゲートウェイを実ポートで起動する
    pub async fn spawn(self) -> TestServer {
        let state = assemble(self.registry, self.flags, self.fallback, self.upstream).unwrap();
        spawn_server(create_app(state, AppOptions::default())).await
    }
}
