//! routegate
//!
//! サービス名/バージョンをパスに持つリクエストをバックエンドへ転送する
//! リバースプロキシゲートウェイ

#![warn(missing_docs)]

/// 共通型定義（エラー型）
pub mod common;

/// HTTPハンドラー
pub mod api;

/// パス解析（サービス名/バージョン抽出）
pub mod route;

/// サービスレジストリ
pub mod registry;

/// トラフィックフラグストア
pub mod flags;

/// トラフィックスイッチ（エンドポイント選択）
pub mod switch;

/// 上流への転送
pub mod forward;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// CLIインターフェース
pub mod cli;

/// サーバー初期化
pub mod bootstrap;

/// サーバー起動・シャットダウン
pub mod server;

/// 協調シャットダウン
pub mod shutdown;

use std::sync::Arc;

/// アプリケーション状態
///
/// レジストリとフラグストアはグローバルではなくここから注入する。
#[derive(Clone)]
pub struct AppState {
    /// エンドポイント選択器
    pub selector: Arc<dyn switch::EndpointSelector>,
    /// 上流転送プロキシ（接続プール共有）
    pub proxy: forward::ForwardingProxy,
}

impl AppState {
    /// 選択器とプロキシからアプリケーション状態を作成
    pub fn new(selector: Arc<dyn switch::EndpointSelector>, proxy: forward::ForwardingProxy) -> Self {
        Self { selector, proxy }
    }
}
