mod client;
mod ext;
pub mod logging;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use perc_compile::NodeCompiler;
use perc_compile::DEFAULT_MODULE;
pub use server::PercolateServer;
use tower_lsp_server::LspService;
use tower_lsp_server::Server;

/// Run the language server over stdio until the client disconnects.
pub async fn serve() -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(|client| {
        let log_guard = logging::init_tracing({
            let client = client.clone();
            move |message_type, message| {
                let client = client.clone();
                tokio::spawn(async move {
                    client.log_message(message_type, message).await;
                });
            }
        });

        let compiler = NodeCompiler::locate().unwrap_or_else(|e| {
            // Saves will surface the failure to start the compiler.
            tracing::warn!("{e}");
            NodeCompiler::new(PathBuf::from("node"), DEFAULT_MODULE)
        });

        PercolateServer::new(client, Arc::new(compiler), log_guard)
    })
    .finish();

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
