//! トラフィックスイッチ
//!
//! レジストリの候補エンドポイントから、外部フラグに基づいて1つを選ぶ。
//! 選択方式は `EndpointSelector` で抽象化しており、ハンドラーは方式に依存しない。

use crate::common::error::GatewayError;
use crate::flags::FlagStore;
use crate::registry::ServiceRegistry;
use crate::route::RouteKey;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// フラグtrue時に選ぶインデックス（プライマリ）
pub const PRIMARY_INDEX: usize = 0;
/// フラグfalse時に選ぶインデックス（セカンダリ）
pub const SECONDARY_INDEX: usize = 1;

/// エンドポイント選択能力
#[async_trait]
pub trait EndpointSelector: Send + Sync {
    /// ルートキーに対する転送先エンドポイントを1つ選ぶ
    ///
    /// 候補が無い場合は `GatewayError::NoEndpointAvailable`
    async fn select(&self, key: &RouteKey) -> Result<String, GatewayError>;
}

/// フラグストア障害時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FlagFallback {
    /// フラグtrueとして扱う（index 0）
    Primary,
    /// フラグfalseとして扱う（index 1）
    #[default]
    Secondary,
}

impl FlagFallback {
    /// フォールバック時に仮定するフラグ値
    pub fn assumed_flag(self) -> bool {
        matches!(self, Self::Primary)
    }
}

/// 2択のフラグゲート式スイッチ
///
/// フラグはリクエストごとに読み直す。同じキーへの連続リクエストでも、
/// 間でフラグが変われば別のエンドポイントに振り分けられる。
pub struct FlagGatedSwitch {
    registry: Arc<dyn ServiceRegistry>,
    flags: Arc<dyn FlagStore>,
    fallback: FlagFallback,
}

impl FlagGatedSwitch {
    /// レジストリとフラグストアからスイッチを作成
    pub fn new(registry: Arc<dyn ServiceRegistry>, flags: Arc<dyn FlagStore>) -> Self {
        Self {
            registry,
            flags,
            fallback: FlagFallback::default(),
        }
    }

    /// フォールバック方針を指定
    pub fn with_fallback(mut self, fallback: FlagFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// 現在のフォールバック方針
    pub fn fallback(&self) -> FlagFallback {
        self.fallback
    }
}

#[async_trait]
impl EndpointSelector for FlagGatedSwitch {
    async fn select(&self, key: &RouteKey) -> Result<String, GatewayError> {
        let not_available = || GatewayError::NoEndpointAvailable {
            service: key.service_name.clone(),
            version: key.service_version.clone(),
        };

        let endpoints = match self
            .registry
            .lookup(&key.service_name, &key.service_version)
        {
            Ok(endpoints) => endpoints,
            Err(GatewayError::ServiceNotFound { .. }) => return Err(not_available()),
            Err(e) => return Err(e),
        };
        if endpoints.is_empty() {
            return Err(not_available());
        }

        let (flag, flag_error) = match self.flags.get_flag(&key.service_version).await {
            Ok(flag) => (flag, None),
            Err(e) => (self.fallback.assumed_flag(), Some(e)),
        };
        let index = if flag { PRIMARY_INDEX } else { SECONDARY_INDEX };

        // 検証済みレジストリでは起こらないが、範囲外でもpanicしない
        let endpoint = endpoints.into_iter().nth(index).ok_or_else(not_available)?;

        if let Some(e) = flag_error {
            warn!(
                route = %key,
                error = %e,
                fallback = ?self.fallback,
                endpoint = %endpoint,
                "Flag store unavailable, applying fallback"
            );
        } else {
            debug!(route = %key, flag, endpoint = %endpoint, "Selected endpoint");
        }

        Ok(endpoint)
    }
}
