//! CLI module for routegate
//!
//! Provides the command-line interface for running and checking the gateway.

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// routegate - Flag-switched reverse proxy gateway
#[derive(Parser, Debug)]
#[command(name = "routegate")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    ROUTEGATE_HOST                          Bind address (default: 0.0.0.0)
    ROUTEGATE_PORT                          Listen port (default: 6330)
    ROUTEGATE_COMPRESS                      Compress responses (default: false)
    ROUTEGATE_REGISTRY_FILE                 Registry file (YAML/JSON, default: built-in routes)
    ROUTEGATE_FLAG_STORE_ADDR               Flag store address (default: 127.0.0.1:6379)
    ROUTEGATE_FLAG_FALLBACK                 primary|secondary when the flag store is down (default: secondary)
    ROUTEGATE_FLAG_STORE_TIMEOUT_MS         Flag read timeout (default: 200)
    ROUTEGATE_UPSTREAM_TIMEOUT_SECS         Upstream request timeout (default: 120)
    ROUTEGATE_UPSTREAM_CONNECT_TIMEOUT_SECS Upstream connect timeout (default: 10)
    ROUTEGATE_UPSTREAM_MAX_CONNS_PER_HOST   Concurrent connections per upstream host (default: 15000)
    ROUTEGATE_UPSTREAM_IDLE_TIMEOUT_SECS    Idle connection lifetime (default: 30)
    ROUTEGATE_LOG_LEVEL                     Log level (default: info)
    ROUTEGATE_LOG_DIR                       Directory for daily rotated log files
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server options used when no subcommand is given
    #[command(flatten)]
    pub serve: serve::ServeArgs,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway server (default)
    Serve(serve::ServeArgs),
    /// Validate the registry and ping the flag store, then exit
    Check(check::CheckArgs),
}

impl Cli {
    /// 実行するサブコマンド（未指定なら serve）
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}
