use clap::{Parser, Subcommand};

use crate::commands::{migrate::MigrateCmd, populate::PopulateCmd};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for game catalog - provides commands to prepare and fill catalog database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Creates database if needed and applies pending migrations
    Migrate(MigrateCmd),
    /// Fills catalog with sample genres and games
    Populate(PopulateCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Migrate(cmd) => cmd.run().await,
            Command::Populate(cmd) => cmd.run().await,
        }
    }
}
