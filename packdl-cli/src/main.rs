//! packdl - command-line interface
//!
//! Lists modpack releases, shows release notes and downloads archives with
//! multiple connections through an optional mirror.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use packdl::config::ConfigFile;

mod commands;
mod error;
mod keys;
mod logging;

use commands::config::ConfigCommands;
use commands::download::DownloadArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "packdl", version, about = "Modpack release browser and multi-threaded downloader")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List available releases grouped by platform version
    List {
        /// Mirror used to reach the release API
        #[arg(short, long)]
        mirror: Option<String>,
    },

    /// Download a release archive
    Download(DownloadArgs),

    /// Show the release notes of a release
    Notes {
        /// Release tag (e.g., 1.21.11-v10-1.6)
        tag: String,

        #[arg(short, long)]
        mirror: Option<String>,
    },

    /// Print the (mirror-rewritten) download link of a release
    Url {
        /// Release tag
        tag: String,

        #[arg(short, long)]
        mirror: Option<String>,
    },

    /// List configured mirrors
    Mirrors,

    /// Check whether a newer packdl release exists
    CheckUpdate,

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_warning) = match ConfigFile::load() {
        Ok(config) => (config, None),
        Err(e) => (ConfigFile::default(), Some(e)),
    };

    let _guard = match logging::init(cli.verbose, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {}", style("warning:").yellow(), e);
            None
        }
    };
    if let Some(e) = config_warning {
        tracing::warn!(error = %e, "Ignoring unreadable config file, using defaults");
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: ConfigFile) -> Result<(), CliError> {
    match command {
        Commands::List { mirror } => commands::list::run(config, mirror),
        Commands::Download(args) => commands::download::run(config, args),
        Commands::Notes { tag, mirror } => commands::notes::run(config, &tag, mirror),
        Commands::Url { tag, mirror } => commands::url::run(config, &tag, mirror),
        Commands::Mirrors => commands::mirrors::run(&config),
        Commands::CheckUpdate => commands::update::run(&config),
        Commands::Config { command } => commands::config::run(command),
    }
}
