use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;

/// Speaks LSP over stdio; logging goes to a file, never to stdout.
#[derive(Debug, Default, Parser)]
pub struct Serve {}

impl Command for Serve {
    async fn execute(&self, _args: &GlobalArgs) -> Result<ExitCode> {
        perc_server::serve().await?;
        Ok(ExitCode::SUCCESS)
    }
}
