//! GraphVC CLI
//!
//! Turns crypto VC funding news into a knowledge graph, and serves the API
//! that does it.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{Cli, Commands};

/// Initialize tracing with optional file logging.
fn init_tracing(log_file: Option<&std::path::Path>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graphvc=info,graphvc_web=debug".into());

    match log_file.and_then(|path| Some((path.parent()?, path.file_name()?))) {
        Some((dir, name)) => {
            let dir = if dir.as_os_str().is_empty() {
                std::path::Path::new(".")
            } else {
                dir
            };
            let _ = std::fs::create_dir_all(dir);
            let appender = tracing_appender::rolling::never(dir, name);

            // Log to both stdout and the file
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve(args) => args.log.clone(),
        _ => None,
    };
    init_tracing(log_file.as_deref());

    cli.execute().await
}
