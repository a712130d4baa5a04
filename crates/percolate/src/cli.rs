use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::commands::PercolateCommand;
use crate::commands::Serve;

/// Compile CoffeeScript files as they are saved.
#[derive(Parser)]
#[command(name = "percolate")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<PercolateCommand>,

    #[command(flatten)]
    pub args: GlobalArgs,
}

/// Parse CLI arguments and execute the chosen command
pub async fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    match cli.command {
        Some(command) => command.execute(&cli.args).await,
        None => Serve::default().execute(&cli.args).await,
    }
}
