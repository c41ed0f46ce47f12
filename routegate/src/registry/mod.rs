//! サービスレジストリ
//!
//! (サービス名, バージョン) → エンドポイントURL一覧 の読み取り専用ルックアップ。
//! スナップショットは不変で、再読み込みは丸ごと差し替える（部分更新は見せない）。

pub mod loader;

use crate::common::error::{ConfigError, GatewayError};
use crate::route::RouteKey;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// エンドポイントURL一覧
///
/// 順序に意味がある: index 0 = プライマリ（フラグtrue）, index 1 = セカンダリ（フラグfalse）
pub type EndpointList = Vec<String>;

/// 1ルートあたりに必要な最小エンドポイント数
///
/// フラグは常にfalseになり得る（フラグストア障害時のフォールバック含む）ため、
/// index 1 が必ず存在しなければならない。
pub const MIN_ENDPOINTS_PER_ROUTE: usize = 2;

/// サービスレジストリのルックアップ能力
pub trait ServiceRegistry: Send + Sync {
    /// ルートキーに対応するエンドポイント一覧を取得
    ///
    /// 未登録の場合は `GatewayError::ServiceNotFound`
    fn lookup(&self, service_name: &str, service_version: &str) -> Result<EndpointList, GatewayError>;
}

/// レジストリの不変スナップショット
///
/// ファイル形式と同じく サービス → バージョン → URL一覧 の入れ子構造。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    services: BTreeMap<String, BTreeMap<String, EndpointList>>,
}

impl RegistrySnapshot {
    /// 空のスナップショットを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 組み込みのデフォルトレジストリ
    pub fn default_routes() -> Self {
        Self::new().with_route(
            "service1",
            "Key",
            ["http://abcMock.com", "https://abcActual.com"],
        )
    }

    /// ルートを追加したスナップショットを返す（ビルダー）
    pub fn with_route<I, S>(mut self, service: &str, version: &str, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(service, version, endpoints);
        self
    }

    /// ルートを追加（既存キーは置き換え）
    pub fn insert<I, S>(&mut self, service: &str, version: &str, endpoints: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services
            .entry(service.to_string())
            .or_default()
            .insert(
                version.to_string(),
                endpoints.into_iter().map(Into::into).collect(),
            );
    }

    /// エンドポイント一覧を参照
    pub fn get(&self, service: &str, version: &str) -> Option<&EndpointList> {
        self.services.get(service)?.get(version)
    }

    /// 登録ルート数
    pub fn route_count(&self) -> usize {
        self.services.values().map(BTreeMap::len).sum()
    }

    /// 全ルートを (キー, エンドポイント一覧) で列挙
    pub fn routes(&self) -> impl Iterator<Item = (RouteKey, &EndpointList)> {
        self.services.iter().flat_map(|(service, versions)| {
            versions
                .iter()
                .map(move |(version, endpoints)| (RouteKey::new(service, version), endpoints))
        })
    }

    /// ロード時の不変条件を検証する
    ///
    /// - 各ルートは `MIN_ENDPOINTS_PER_ROUTE` 個以上のエンドポイントを持つ
    /// - 各エンドポイントは http/https の絶対URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, endpoints) in self.routes() {
            let invalid = |reason: String| ConfigError::InvalidEntry {
                service: key.service_name.clone(),
                version: key.service_version.clone(),
                reason,
            };

            if endpoints.len() < MIN_ENDPOINTS_PER_ROUTE {
                return Err(invalid(format!(
                    "expected at least {} endpoints (primary, secondary), found {}",
                    MIN_ENDPOINTS_PER_ROUTE,
                    endpoints.len()
                )));
            }

            for endpoint in endpoints {
                let url = reqwest::Url::parse(endpoint)
                    .map_err(|e| invalid(format!("endpoint '{}' is not a URL: {}", endpoint, e)))?;
                if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                    return Err(invalid(format!(
                        "endpoint '{}' must be an absolute http(s) URL",
                        endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 静的データに基づくレジストリ
///
/// 参照はロックフリー（`ArcSwap`）。再読み込みは検証済みスナップショットの差し替えのみ。
#[derive(Debug)]
pub struct StaticRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
}

impl StaticRegistry {
    /// 検証済みスナップショットからレジストリを作成
    pub fn new(snapshot: RegistrySnapshot) -> Result<Self, ConfigError> {
        snapshot.validate()?;
        info!(routes = snapshot.route_count(), "Loaded service registry");
        Ok(Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    /// スナップショットを差し替える
    ///
    /// 検証に失敗した場合は既存のスナップショットを維持する。
    pub fn reload(&self, snapshot: RegistrySnapshot) -> Result<(), ConfigError> {
        snapshot.validate()?;
        let routes = snapshot.route_count();
        self.snapshot.store(Arc::new(snapshot));
        info!(routes, "Reloaded service registry");
        Ok(())
    }

    /// 現在のスナップショットを取得
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }
}

impl ServiceRegistry for StaticRegistry {
    fn lookup(&self, service_name: &str, service_version: &str) -> Result<EndpointList, GatewayError> {
        self.snapshot
            .load()
            .get(service_name, service_version)
            .cloned()
            .ok_or_else(|| GatewayError::ServiceNotFound {
                service: service_name.to_string(),
                version: service_version.to_string(),
            })
    }
}
