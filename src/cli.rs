//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Docker Hadoop - Generate a docker-compose Hadoop ecosystem cluster
#[derive(Parser, Debug)]
#[command(name = "docker-hadoop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision the cluster tree and write docker-compose.yml
    Generate(commands::generate::GenerateArgs),

    /// Print the containers a selection would produce
    Topology(commands::topology::TopologyArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Generate(args) => commands::generate::execute(args, &self.color),
            Commands::Topology(args) => commands::topology::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG`, when set, refines the filters given by `--log-level`.
fn init_logging(level: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
