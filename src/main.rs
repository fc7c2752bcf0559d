//! Binary entrypoint for the Outpost server CLI.
//!
//! Commands:
//! - `start` - run the simulation server (tick driver + session operations)
//! - `init` - create a starter `config.toml` and default catalog seeds
//! - `status` - print profile/offer counts from the store
//!
//! See the library crate docs for module-level details: `outpost::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use outpost::catalog::Catalog;
use outpost::config::Config;
use outpost::server::SimServer;

#[derive(Parser)]
#[command(name = "outpost")]
#[command(about = "Server-side simulation backend for a persistent-world extraction game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the simulation server
    Start,
    /// Initialize a new configuration and default catalog seeds
    Init,
    /// Show store status and a brief summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    if !matches!(cli.command, Commands::Init) {
        init_logging(&pre_config, cli.verbose);
    }

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting Outpost v{}", env!("CARGO_PKG_VERSION"));

            let mut server = SimServer::new(config)?;
            server.run().await?;
            info!("Outpost stopped");
        }
        Commands::Init => {
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                println!("Config file '{}' already exists, leaving it alone", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                println!("Wrote default configuration to '{}'", cli.config);
            }

            let config = Config::load(&cli.config).await?;
            Catalog::write_default_seeds(&config.server.seeds_dir)?;
            println!("Seed data ready in '{}'", config.server.seeds_dir);
            println!("Run 'outpost start' to launch the server.");
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let server = SimServer::new(config)?;
            println!("Profiles: {}", server.profile_count());
            println!("Live marketplace offers: {}", server.offer_count());
        }
    }

    Ok(())
}

/// Initialize env_logger honoring the config level, CLI verbosity, and
/// whether stdout is a TTY (plain output when piped).
fn init_logging(config: &Option<Config>, verbose: u8) {
    let base_level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());

    let level = match verbose {
        0 => base_level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env = env_logger::Env::default().default_filter_or(level);
    let mut builder = env_logger::Builder::from_env(env);
    if !atty::is(atty::Stream::Stdout) {
        builder.format_timestamp_secs();
    }
    let _ = builder.try_init();
}
