//! routegate Server Entry Point

use clap::Parser;
use routegate::cli::{Cli, Commands};
use routegate::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ファイル出力のガードはプロセス終了まで保持する
    let log_guard = match logging::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.into_command() {
        Commands::Serve(args) => routegate::cli::serve::execute(args).await,
        Commands::Check(args) => routegate::cli::check::execute(&args).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
