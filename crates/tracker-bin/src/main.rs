//! Distance tracker - replays recorded fixes through the tracking core.

mod commands;
mod providers;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracker_config_and_utils::{init_logging, Config, Paths};

/// Distance tracker command-line interface.
#[derive(Parser)]
#[command(name = "distance-tracker")]
#[command(about = "Accumulate travelled distance from a stream of location fixes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (store, logs, config). Defaults to ~/.distance-tracker
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(long, global = true)]
    log_stderr: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON array of fixes and report the travelled distance
    Track {
        /// File containing `[{"latitude": .., "longitude": .., "timestamp": ..}, ...]`
        #[arg(short, long)]
        fixes: PathBuf,

        /// Simulate the user refusing location access
        #[arg(long)]
        deny_permission: bool,

        /// Delay between replayed fixes, in milliseconds
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the saved last location
    LastLocation,
    /// Delete the saved last location
    Clear,
    /// Show the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, Some(paths.log_file()), cli.log_stderr);

    match cli.command {
        Commands::Track {
            fixes,
            deny_permission,
            pace_ms,
            json,
        } => {
            commands::track(
                &config,
                &paths,
                commands::TrackOptions {
                    fixes,
                    deny_permission,
                    pace_ms,
                    json,
                },
            )
            .await?;
        }
        Commands::LastLocation => commands::last_location(&paths).await?,
        Commands::Clear => commands::clear(&paths).await?,
        Commands::Config { write } => commands::show_config(&config, &paths, write)?,
    }

    Ok(())
}
