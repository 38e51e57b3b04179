//! CLI for the agentflow API server

pub mod serve;

use clap::{Parser, Subcommand};

/// Agentflow - workflow run engine over multiple LLM providers
#[derive(Parser)]
#[command(name = "agentflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
