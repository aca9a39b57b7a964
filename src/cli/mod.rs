//! CLI module for QuantumViz.
//!
//! Subcommands:
//! - `map`: Run the mapping pipeline on a file and print the graph
//! - `categories`: List the category registry

mod categories;
mod map;

use clap::{Parser, Subcommand};

pub use map::MapCommand;

/// QuantumViz - data-to-3D-graph mapper
#[derive(Parser)]
#[command(name = "quantumviz")]
#[command(about = "Turn text, tables and JSON into positioned 3D graphs")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map a text or JSON file to a graph
    Map(MapCommand),

    /// List categories and their model tiers
    Categories,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Map(cmd) => cmd.run().await,
            Command::Categories => self.run_categories(),
        }
    }
}
