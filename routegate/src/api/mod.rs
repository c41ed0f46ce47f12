//! HTTPハンドラー
//!
//! すべてのメソッド・パスをゲートウェイハンドラーで受ける

pub mod error;
pub mod gateway;

use crate::AppState;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// アプリケーションのオプション
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppOptions {
    /// レスポンス圧縮を有効にする
    pub compress: bool,
}

/// ゲートウェイのルーターを作成
pub fn create_app(state: AppState, options: AppOptions) -> Router {
    let app = Router::new()
        .fallback(gateway::handle)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if options.compress {
        app.layer(CompressionLayer::new())
    } else {
        app
    }
}
