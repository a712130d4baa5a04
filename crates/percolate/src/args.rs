use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Only print errors.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use verbose output. Repeat for more detail.
    #[arg(global = true, action = clap::ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Log filter for hosts that log to the terminal.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
