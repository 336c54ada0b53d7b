//! # Docker Hadoop CLI
//!
//! Binary entry point for the `docker-hadoop` command-line tool. It parses
//! arguments with `clap`, initialises logging and dispatches to one of the
//! command modules. All provisioning logic lives in the `docker_hadoop`
//! library; an error returned from a command is printed by `anyhow` and the
//! process exits non-zero.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
