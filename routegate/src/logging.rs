//! ロギング初期化ユーティリティ
//!
//! 標準エラー出力へのfmtレイヤーに加え、`ROUTEGATE_LOG_DIR` が設定されていれば
//! 日次ローテーションのファイル出力を追加する。

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// デフォルトのログレベル
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// ログファイル名のプレフィックス
pub const LOG_FILE_PREFIX: &str = "routegate.log";

/// ログレベルのフィルタ文字列を取得
///
/// `ROUTEGATE_LOG_LEVEL` → `RUST_LOG` → `info` の順で解決する（空文字は未設定扱い）。
pub fn filter_directive() -> String {
    ["ROUTEGATE_LOG_LEVEL", "RUST_LOG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// グローバルサブスクライバーを初期化
///
/// ファイル出力を有効にした場合は `WorkerGuard` を返す。
/// 呼び出し元はプロセス終了まで保持すること（ドロップするとバッファが書き出されない）。
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let directive = filter_directive();
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(&directive));

    match std::env::var("ROUTEGATE_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {dir}"))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter(&directive));

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
            Ok(Some(guard))
        }
        _ => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
            Ok(None)
        }
    }
}
