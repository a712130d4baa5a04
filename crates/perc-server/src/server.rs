use std::sync::Arc;

use camino::Utf8PathBuf;
use perc_compile::Compiler;
use perc_workspace::WorkspaceRegistry;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::jsonrpc::Result as LspResult;
use tower_lsp_server::ls_types::DidChangeConfigurationParams;
use tower_lsp_server::ls_types::DidChangeWorkspaceFoldersParams;
use tower_lsp_server::ls_types::DidSaveTextDocumentParams;
use tower_lsp_server::ls_types::InitializeParams;
use tower_lsp_server::ls_types::InitializeResult;
use tower_lsp_server::ls_types::InitializedParams;
use tower_lsp_server::ls_types::OneOf;
use tower_lsp_server::ls_types::SaveOptions;
use tower_lsp_server::ls_types::ServerCapabilities;
use tower_lsp_server::ls_types::ServerInfo;
use tower_lsp_server::ls_types::TextDocumentSyncCapability;
use tower_lsp_server::ls_types::TextDocumentSyncKind;
use tower_lsp_server::ls_types::TextDocumentSyncOptions;
use tower_lsp_server::ls_types::WorkspaceFolder;
use tower_lsp_server::ls_types::WorkspaceFoldersServerCapabilities;
use tower_lsp_server::ls_types::WorkspaceServerCapabilities;
use tower_lsp_server::Client;
use tower_lsp_server::LanguageServer;
use tracing_appender::non_blocking::WorkerGuard;

use crate::client::ClientConfigSource;
use crate::client::ClientNotifier;
use crate::ext::UriExt;

const SERVER_NAME: &str = "Percolate";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State gathered during the handshake.
#[derive(Default)]
pub struct Session {
    /// Folders reported by `initialize`, opened on `initialized`.
    pending_roots: Vec<Utf8PathBuf>,
}

pub struct PercolateServer {
    registry: Arc<WorkspaceRegistry>,
    config_source: Arc<ClientConfigSource>,
    session: Arc<RwLock<Session>>,
    _log_guard: WorkerGuard,
}

impl PercolateServer {
    #[must_use]
    pub fn new(client: Client, compiler: Arc<dyn Compiler>, log_guard: WorkerGuard) -> Self {
        let config_source = Arc::new(ClientConfigSource::new(client.clone()));
        let registry = Arc::new(WorkspaceRegistry::new(
            config_source.clone(),
            compiler,
            Arc::new(ClientNotifier::new(client)),
            CancellationToken::new(),
        ));

        Self {
            registry,
            config_source,
            session: Arc::new(RwLock::new(Session::default())),
            _log_guard: log_guard,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<WorkspaceRegistry> {
        &self.registry
    }

    pub async fn with_session_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.write().await;
        f(&mut session)
    }
}

fn folder_roots(folders: &[WorkspaceFolder]) -> Vec<Utf8PathBuf> {
    folders
        .iter()
        .filter_map(|folder| {
            let root = folder.uri.to_utf8_path_buf();
            if root.is_none() {
                tracing::warn!("Ignoring workspace folder {}", folder.uri.as_str());
            }
            root
        })
        .collect()
}

impl LanguageServer for PercolateServer {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        tracing::info!("Initializing server...");

        let supports_configuration = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|workspace| workspace.configuration)
            .unwrap_or(false);
        self.config_source
            .set_supports_configuration(supports_configuration);

        let roots = folder_roots(params.workspace_folders.as_deref().unwrap_or_default());
        self.with_session_mut(|session| session.pending_roots = roots)
            .await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(false),
                        change: Some(TextDocumentSyncKind::NONE),
                        will_save: Some(false),
                        will_save_wait_until: Some(false),
                        save: Some(SaveOptions::default().into()),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let roots = self
            .with_session_mut(|session| std::mem::take(&mut session.pending_roots))
            .await;

        if roots.is_empty() {
            tracing::info!("No workspace folders; waiting for folders to be added");
            return;
        }

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            for root in roots {
                registry.add_folder(&root).await;
            }
        });
    }

    async fn shutdown(&self) -> LspResult<()> {
        tracing::info!("Shutting down");
        self.registry.shutdown();
        Ok(())
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        for root in folder_roots(&params.event.removed) {
            self.registry.remove_folder(&root);
        }

        let added = folder_roots(&params.event.added);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            for root in added {
                registry.add_folder(&root).await;
            }
        });
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        tracing::debug!("Configuration changed, reloading workspaces");
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            registry.reload_all().await;
        });
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(path) = params.text_document.uri.to_utf8_path_buf() else {
            return;
        };

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            if !registry.reload_project_file(&path).await {
                registry.dispatch_save(&path).await;
            }
        });
    }
}
