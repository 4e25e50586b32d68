mod config_cmd;
mod replay_cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use weatherbot_config::{config_dir, config_file_path, load_and_prepare, BotConfig};

#[derive(Parser)]
#[command(name = "weatherbot")]
#[command(about = "Weather bot admission core: rate limiting and abuse protection")]
#[command(version)]
struct Cli {
    /// Path to config.yaml (defaults to ~/.weatherbot/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the config, then print it with secrets masked
    CheckConfig,
    /// Write a config file populated with defaults
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Feed JSON-lines requests through the admission gate and print decisions
    Replay {
        /// Input file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Print the effective limits
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::InitConfig { force } => config_cmd::init(&path, force).await,
        Commands::CheckConfig => config_cmd::check(&prepare(&path).await?),
        Commands::Stats => config_cmd::limits(&prepare(&path).await?),
        Commands::Replay { input } => {
            let config = prepare(&path).await?;
            replay_cmd::run(&config, input.as_deref()).await
        }
    }
}

/// Load the config (fatal on validation errors) and start logging.
async fn prepare(path: &Path) -> Result<BotConfig> {
    let config = load_and_prepare(path).await?;
    weatherbot_logging::init_logger(
        &config.logging.level,
        config.logging.dir.as_deref().map(Path::new),
        config.logging.json,
    );
    Ok(config)
}
