use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smstodo_core::config::Config;

#[derive(Parser)]
#[command(
    name = "smstodo",
    about = "SMS-driven shared todo list — webhook server for the SMS gateway",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook HTTP server
    Serve {
        /// Port to listen on (overrides $PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Database file path (overrides $SMSTODO_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Log replies instead of sending them through the gateway
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and exit
    Check,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve { port, db, dry_run } => serve(port, db, dry_run),
        Commands::Check => check(),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config() -> anyhow::Result<Config> {
    // Missing secrets must stop the process before it serves traffic.
    Ok(Config::from_env()?)
}

fn serve(port: Option<u16>, db: Option<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(db) = db {
        config.db_path = db;
    }

    tokio::runtime::Runtime::new()?.block_on(smstodo_server::serve(config, dry_run))
}

fn check() -> anyhow::Result<()> {
    let config = load_config()?;
    println!(
        "configuration ok: service number {}, db {}, port {}",
        config.service_number,
        config.db_path.display(),
        config.port
    );
    Ok(())
}
