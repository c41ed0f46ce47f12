//! axumサーバー起動・シャットダウンハンドリング

use crate::api::{create_app, AppOptions};
use crate::bootstrap::load_registry;
use crate::common::error::ConfigError;
use crate::registry::StaticRegistry;
use crate::shutdown::ShutdownController;
use crate::AppState;
use anyhow::Context;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// サーバー起動オプション
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// アプリケーションのオプション
    pub app: AppOptions,
    /// SIGHUP時に読み直すレジストリファイル
    pub registry_file: Option<PathBuf>,
}

/// 指定アドレスにバインドしてサーバーを起動する
pub async fn run(
    state: AppState,
    registry: Arc<StaticRegistry>,
    bind_addr: &str,
    options: ServerOptions,
    shutdown: ShutdownController,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to address {bind_addr}"))?;

    info!("routegate listening on {}", listener.local_addr()?);

    serve(listener, state, registry, options, shutdown).await
}

/// バインド済みリスナーでサーバーを起動し、シャットダウンシグナルを待機する
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    registry: Arc<StaticRegistry>,
    options: ServerOptions,
    shutdown: ShutdownController,
) -> anyhow::Result<()> {
    let app = create_app(state, options.app);

    let reload_task = tokio::spawn(reload_on_hangup(
        registry,
        options.registry_file.clone(),
        shutdown.clone(),
    ));

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("Server error");

    shutdown.request_shutdown();
    reload_task.abort();

    info!("Server shutdown complete");
    result
}

/// レジストリファイルを読み直して差し替える
///
/// ファイル未指定なら何もしない。失敗時は既存のスナップショットを維持する。
pub fn reload_registry(
    registry: &StaticRegistry,
    registry_file: Option<&Path>,
) -> Result<bool, ConfigError> {
    let Some(path) = registry_file else {
        info!("No registry file configured, keeping built-in routes");
        return Ok(false);
    };
    let snapshot = load_registry(Some(path))?;
    registry.reload(snapshot)?;
    Ok(true)
}

#[cfg(unix)]
async fn reload_on_hangup(
    registry: Arc<StaticRegistry>,
    registry_file: Option<PathBuf>,
    shutdown: ShutdownController,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            error!("Failed to install SIGHUP handler: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            received = hangup.recv() => {
                if received.is_none() {
                    return;
                }
                info!("Received SIGHUP, reloading service registry...");
                if let Err(e) = reload_registry(&registry, registry_file.as_deref()) {
                    error!(error = %e, "Registry reload failed, keeping previous routes");
                }
            }
            _ = shutdown.wait() => return,
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(
    _registry: Arc<StaticRegistry>,
    _registry_file: Option<PathBuf>,
    shutdown: ShutdownController,
) {
    shutdown.wait().await;
}

/// シャットダウンシグナルを待機
async fn shutdown_signal(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }
}
