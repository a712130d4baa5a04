use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use perc_compile::NodeCompiler;
use perc_workspace::FileConfigSource;
use perc_workspace::TracingNotifier;
use perc_workspace::WatchConfig;
use perc_workspace::WatchHost;
use perc_workspace::WorkspaceRegistry;
use perc_workspace::DEFAULT_DEBOUNCE;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::args::GlobalArgs;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Watch {
    /// Workspace roots to watch [default: current directory]
    roots: Vec<PathBuf>,

    /// Milliseconds a file must stay unchanged before it is compiled
    #[arg(long, default_value_t = default_debounce_ms())]
    debounce: u64,
}

fn default_debounce_ms() -> u64 {
    u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(100)
}

impl Watch {
    fn resolve_roots(&self) -> Result<Vec<Utf8PathBuf>> {
        let roots = if self.roots.is_empty() {
            vec![std::env::current_dir().context("Failed to read current directory")?]
        } else {
            self.roots.clone()
        };

        roots
            .into_iter()
            .map(|root| {
                let canonical = std::fs::canonicalize(&root)
                    .with_context(|| format!("Cannot watch {}", root.display()))?;
                Utf8PathBuf::from_path_buf(canonical)
                    .map_err(|path| anyhow::anyhow!("Not a UTF-8 path: {}", path.display()))
            })
            .collect()
    }
}

fn init_tracing(args: &GlobalArgs) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl Command for Watch {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        let roots = self.resolve_roots()?;
        init_tracing(args);

        let compiler = NodeCompiler::locate()?;
        let token = CancellationToken::new();
        let registry = Arc::new(WorkspaceRegistry::new(
            Arc::new(FileConfigSource),
            Arc::new(compiler),
            Arc::new(TracingNotifier),
            token.clone(),
        ));
        for root in &roots {
            registry.add_folder(root).await;
        }

        tokio::spawn({
            let token = token.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupted");
                }
                token.cancel();
            }
        });

        let config = WatchConfig {
            roots,
            debounce: Duration::from_millis(self.debounce),
        };
        let result = WatchHost::new(Arc::clone(&registry))
            .run(config, token)
            .await;
        registry.shutdown();
        result?;

        Ok(ExitCode::SUCCESS)
    }
}
