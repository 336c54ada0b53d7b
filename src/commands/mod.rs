//! # CLI Command Implementations
//!
//! One file per `docker-hadoop` subcommand. Each defines a `clap` `Args`
//! struct and an `execute` function that calls into the `docker_hadoop`
//! library.

pub mod completions;
pub mod generate;
pub mod selection;
pub mod topology;
