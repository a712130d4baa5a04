mod serve;
mod watch;

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::args::GlobalArgs;
pub use crate::commands::serve::Serve;
pub use crate::commands::watch::Watch;

pub trait Command {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode>;
}

#[derive(Debug, Subcommand)]
pub enum PercolateCommand {
    /// Start the LSP server (the default)
    Serve(Serve),
    /// Watch directories and compile files as they change on disk
    Watch(Watch),
}

impl Command for PercolateCommand {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        match self {
            Self::Serve(serve) => serve.execute(args).await,
            Self::Watch(watch) => watch.execute(args).await,
        }
    }
}
