//! serve サブコマンド
//!
//! ゲートウェイサーバーを起動します。

use crate::api::AppOptions;
use crate::bootstrap::{self, GatewaySettings};
use crate::config::{FlagStoreConfig, UpstreamConfig};
use crate::server::{self, ServerOptions};
use crate::shutdown::ShutdownController;
use crate::switch::FlagFallback;
use clap::Args;
use std::path::PathBuf;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, default_value = "6330", env = "ROUTEGATE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "ROUTEGATE_HOST")]
    pub host: String,

    /// Compress responses (gzip)
    #[arg(long, default_value_t = false, env = "ROUTEGATE_COMPRESS")]
    pub compress: bool,

    /// Registry file (YAML, or JSON with a .json extension)
    #[arg(long, env = "ROUTEGATE_REGISTRY_FILE")]
    pub registry: Option<PathBuf>,

    /// Flag store address (host:port)
    #[arg(long, default_value = "127.0.0.1:6379", env = "ROUTEGATE_FLAG_STORE_ADDR")]
    pub flag_store: String,

    /// Endpoint to use when the flag store cannot be read
    #[arg(long, value_enum, default_value_t = FlagFallback::Secondary, env = "ROUTEGATE_FLAG_FALLBACK")]
    pub flag_fallback: FlagFallback,
}

impl ServeArgs {
    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 初期化設定を組み立てる（タイムアウト等は環境変数から）
    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            registry_file: self.registry.clone(),
            flag_store: FlagStoreConfig::from_env(self.flag_store.clone()),
            fallback: self.flag_fallback,
            upstream: UpstreamConfig::from_env(),
        }
    }
}

/// サーバーを起動し、シャットダウンまでブロックする
pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let ctx = bootstrap::initialize(args.settings()).await?;
    let options = ServerOptions {
        app: AppOptions {
            compress: args.compress,
        },
        registry_file: args.registry.clone(),
    };

    server::run(
        ctx.state,
        ctx.registry,
        &args.bind_addr(),
        options,
        ShutdownController::default(),
    )
    .await
}
