//! サーバー初期化ロジック
//!
//! レジストリ読み込み、フラグストア接続確認、上流クライアント構築など
//! サーバー起動に必要なコンポーネントの初期化を担当する。

use crate::common::error::ConfigError;
use crate::config::{FlagStoreConfig, UpstreamConfig};
use crate::flags::{FlagStore, RedisFlagStore};
use crate::forward::ForwardingProxy;
use crate::registry::{loader, RegistrySnapshot, StaticRegistry};
use crate::switch::{FlagFallback, FlagGatedSwitch};
use crate::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 初期化に必要な設定
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// レジストリファイル（未指定なら組み込みのデフォルト）
    pub registry_file: Option<PathBuf>,
    /// フラグストア接続設定
    pub flag_store: FlagStoreConfig,
    /// フラグストア障害時の扱い
    pub fallback: FlagFallback,
    /// 上流クライアント設定
    pub upstream: UpstreamConfig,
}

/// 初期化結果
///
/// `AppState` に加え、再読み込み用にレジストリのハンドルを保持する。
pub struct InitContext {
    /// アプリケーション状態
    pub state: AppState,
    /// レジストリ（SIGHUPで差し替える）
    pub registry: Arc<StaticRegistry>,
    /// フラグストア
    pub flags: Arc<dyn FlagStore>,
}

/// レジストリを読み込む
///
/// パス未指定なら組み込みのデフォルトルートを返す。
pub fn load_registry(path: Option<&Path>) -> Result<RegistrySnapshot, ConfigError> {
    match path {
        Some(path) => loader::load_from_file(path),
        None => Ok(RegistrySnapshot::default_routes()),
    }
}

/// 構築済みのレジストリとフラグストアから `AppState` を組み立てる
pub fn assemble(
    registry: Arc<StaticRegistry>,
    flags: Arc<dyn FlagStore>,
    fallback: FlagFallback,
    upstream: UpstreamConfig,
) -> Result<AppState, ConfigError> {
    let proxy = ForwardingProxy::new(upstream)?;
    let selector = FlagGatedSwitch::new(registry, flags).with_fallback(fallback);
    Ok(AppState::new(Arc::new(selector), proxy))
}

/// サーバー初期化を実行する
///
/// フラグストアに到達できなくても起動は続ける（リクエスト時にフォールバックする）。
pub async fn initialize(settings: GatewaySettings) -> Result<InitContext, ConfigError> {
    info!("routegate v{}", env!("CARGO_PKG_VERSION"));

    let snapshot = load_registry(settings.registry_file.as_deref())?;
    let registry = Arc::new(StaticRegistry::new(snapshot)?);

    let flags: Arc<dyn FlagStore> = Arc::new(RedisFlagStore::new(settings.flag_store.clone())?);
    match flags.ping().await {
        Ok(()) => info!(addr = %settings.flag_store.addr, "Flag store reachable"),
        Err(e) => warn!(
            addr = %settings.flag_store.addr,
            error = %e,
            fallback = ?settings.fallback,
            "Flag store unreachable at startup, requests will use the fallback until it recovers"
        ),
    }

    let state = assemble(
        registry.clone(),
        flags.clone(),
        settings.fallback,
        settings.upstream,
    )?;

    Ok(InitContext {
        state,
        registry,
        flags,
    })
}
