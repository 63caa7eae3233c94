pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "devstrap")]
#[command(version)]
#[command(about = "Bootstrap a Linux workstation with curated tool tiers")]
#[command(long_about = "Install tiers of command-line tools through apt, plus tools that only ship as upstream releases.\n\nSafe to re-run: anything already on your PATH is left alone.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available tiers
    Tiers,

    /// Show which entries of a tier are already installed
    Status {
        /// Tier to inspect (default: overview of every tier)
        tier: Option<String>,
    },

    /// Install every missing entry of a tier through apt
    Install {
        /// Tier to install (prompted when omitted)
        tier: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Install tools from their upstream releases
    Manual {
        /// Tools to install (prompted when omitted)
        tools: Vec<String>,

        /// Install every known manual tool
        #[arg(long, conflicts_with = "tools")]
        all: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Create compatibility links and group memberships for installed tools
    Reconcile,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self, config: &AppConfig) -> Result<()> {
        match self.command {
            Commands::Tiers => commands::tiers::execute(config),
            Commands::Status { tier } => commands::status::execute(config, tier),
            Commands::Install { tier, yes } => commands::install::execute(config, tier, yes).await,
            Commands::Manual { tools, all, yes } => {
                commands::manual::execute(config, tools, all, yes).await
            }
            Commands::Reconcile => commands::reconcile::execute(config).await,
            Commands::Config { command } => match command {
                ConfigCommands::Show => commands::config::show(config),
                ConfigCommands::Path => commands::config::path(),
                ConfigCommands::Init { force } => commands::config::init(force),
            },
        }
    }
}
