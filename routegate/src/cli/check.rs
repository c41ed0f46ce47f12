//! check サブコマンド
//!
//! レジストリを検証し、フラグストアへの到達性を確認して終了します。

use crate::bootstrap::load_registry;
use crate::config::FlagStoreConfig;
use crate::flags::{FlagStore, RedisFlagStore};
use clap::Args;
use std::path::PathBuf;

/// check サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Registry file (YAML, or JSON with a .json extension)
    #[arg(long, env = "ROUTEGATE_REGISTRY_FILE")]
    pub registry: Option<PathBuf>,

    /// Flag store address (host:port)
    #[arg(long, default_value = "127.0.0.1:6379", env = "ROUTEGATE_FLAG_STORE_ADDR")]
    pub flag_store: String,
}

/// 検証を実行する
///
/// レジストリが不正ならエラーを返す。フラグストアに届かない場合は表示のみ
/// （実行時はフォールバックで動作できるため）。
pub async fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let snapshot = load_registry(args.registry.as_deref())?;
    snapshot.validate()?;

    let source = args
        .registry
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    println!("Registry OK ({}): {} route(s)", source, snapshot.route_count());
    for (key, endpoints) in snapshot.routes() {
        println!("  {} -> {}", key, endpoints.join(", "));
    }

    let store = RedisFlagStore::new(FlagStoreConfig::from_env(args.flag_store.clone()))?;
    match store.ping().await {
        Ok(()) => println!("Flag store OK ({})", store.addr()),
        Err(e) => println!("Flag store UNREACHABLE ({}): {}", store.addr(), e),
    }

    Ok(())
}
