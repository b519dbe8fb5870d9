use anyhow::{Context, Result};
use bounty_node::{config, logging, node};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bounty-node")]
#[command(about = "Bounty escrow ledger node", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node and serve the HTTP API
    Start {
        /// Address to bind the HTTP API to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port for the HTTP API [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory for configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (ignore if it doesn't)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let early_config = config::NodeConfig::load(cli.config.as_deref()).ok();
    let mut logging_config = early_config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        if !level.is_empty() {
            logging_config.level = level;
        }
    }

    if let Err(e) = logging::init_logging(&logging_config, cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        let log_level = logging::effective_level(&logging_config, cli.verbose);
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bounty={}", log_level)),
            ))
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    }

    match cli.command {
        Commands::Start { host, port } => {
            // Priority order: CLI args > ENV vars > Config file > Defaults
            let mut config = config::NodeConfig::load(cli.config.as_deref())?;
            config.apply_env_overrides();
            config.apply_cli_overrides(host, port);

            info!(
                version = env!("CARGO_PKG_VERSION"),
                name = %config.node.name,
                api = %format!("{}:{}", config.api.host, config.api.port),
                snapshot_path = ?config.storage.snapshot_path,
                "🧬 Starting bounty node"
            );

            let (state, router) = node::build(&config).await?;

            if !config.api.enabled {
                warn!("⚠️ API disabled in config, node idles until shutdown");
                tokio::signal::ctrl_c().await?;
            } else {
                bounty_node::api::serve(router, &config.api.host, config.api.port, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            }

            info!("🛑 Shutting down gracefully");
            state.persist().await;
            Ok(())
        }

        Commands::Init { output } => {
            info!(output_dir = ?output, "🧬 Initializing new node configuration");

            std::fs::create_dir_all(&output)
                .with_context(|| format!("creating {}", output.display()))?;

            let config_path = output.join("bounty-config.toml");
            if config_path.exists() {
                anyhow::bail!("{} already exists", config_path.display());
            }

            let mut config = config::NodeConfig::default();
            config.storage.snapshot_path = Some(output.join("data").join("snapshot.json"));
            config.save_to_file(&config_path)?;

            info!(path = %config_path.display(), "✅ Configuration written");
            Ok(())
        }
    }
}
