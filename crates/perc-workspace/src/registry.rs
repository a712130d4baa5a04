//! The set of open workspaces.
//!
//! The registry is the only owner of workspace lifetimes. Readers take a
//! cheap snapshot of the list; add and remove build a new list and swap it
//! in, so dispatch never observes a half-updated collection.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use perc_compile::Compiler;
use tokio_util::sync::CancellationToken;

use crate::notifier::Notifier;
use crate::paths::is_project_file;
use crate::paths::normalize;
use crate::store::ConfigSource;
use crate::workspace::SaveOutcome;
use crate::workspace::Workspace;

type Workspaces = Arc<Vec<Arc<Workspace>>>;

pub struct WorkspaceRegistry {
    workspaces: RwLock<Workspaces>,
    source: Arc<dyn ConfigSource>,
    compiler: Arc<dyn Compiler>,
    notifier: Arc<dyn Notifier>,
    token: CancellationToken,
}

impl WorkspaceRegistry {
    #[must_use]
    pub fn new(
        source: Arc<dyn ConfigSource>,
        compiler: Arc<dyn Compiler>,
        notifier: Arc<dyn Notifier>,
        token: CancellationToken,
    ) -> Self {
        Self {
            workspaces: RwLock::new(Arc::new(Vec::new())),
            source,
            compiler,
            notifier,
            token,
        }
    }

    fn snapshot(&self) -> Workspaces {
        Arc::clone(
            &self
                .workspaces
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Swap in a new list built from the current one.
    fn update<R>(&self, f: impl FnOnce(&mut Vec<Arc<Workspace>>) -> R) -> R {
        let mut guard = self
            .workspaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.as_ref().clone();
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    #[must_use]
    pub fn roots(&self) -> Vec<Utf8PathBuf> {
        self.snapshot()
            .iter()
            .map(|workspace| workspace.root().to_owned())
            .collect()
    }

    /// The first workspace whose root contains `path`.
    #[must_use]
    pub fn workspace_for(&self, path: &Utf8Path) -> Option<Arc<Workspace>> {
        self.snapshot()
            .iter()
            .find(|workspace| workspace.contains(path))
            .cloned()
    }

    /// Open a workspace for `root` and load its configuration.
    ///
    /// The workspace is registered before its first load so that a removal
    /// arriving in the meantime disposes it; saves are skipped until the
    /// load finishes. Adding a root that is already open returns the
    /// existing workspace.
    pub async fn add_folder(&self, root: &Utf8Path) -> Arc<Workspace> {
        let root = normalize(root);
        let workspace = Arc::new(Workspace::new(&root, Arc::clone(&self.source)));

        let existing = self.update(|workspaces| {
            if let Some(existing) = workspaces.iter().find(|w| w.root() == root.as_path()) {
                return Some(Arc::clone(existing));
            }
            workspaces.push(Arc::clone(&workspace));
            None
        });
        if let Some(existing) = existing {
            return existing;
        }

        workspace.initialize().await;
        if workspace.is_live() {
            tracing::info!(root = %root, "workspace added");
        } else {
            tracing::debug!(root = %root, "workspace removed before it finished loading");
        }
        workspace
    }

    /// Close the workspace for `root`. Returns false if none was open.
    pub fn remove_folder(&self, root: &Utf8Path) -> bool {
        let root = normalize(root);
        let removed = self.update(|workspaces| {
            let index = workspaces.iter().position(|w| w.root() == root.as_path())?;
            Some(workspaces.remove(index))
        });

        match removed {
            Some(workspace) => {
                workspace.dispose();
                tracing::info!(root = %root, "workspace removed");
                true
            }
            None => false,
        }
    }

    /// Route a save to its owning workspace.
    ///
    /// Returns `None` when shutting down, when no workspace owns the path,
    /// or when the handler itself died. Nothing propagates out of here.
    pub async fn dispatch_save(&self, path: &Utf8Path) -> Option<SaveOutcome> {
        if self.token.is_cancelled() {
            tracing::trace!(path = %path, "shutting down, save ignored");
            return None;
        }

        let Some(workspace) = self.workspace_for(path) else {
            tracing::trace!(path = %path, "no workspace owns this file");
            return None;
        };

        let path = path.to_owned();
        let compiler = Arc::clone(&self.compiler);
        let notifier = Arc::clone(&self.notifier);
        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            workspace
                .handle_save(&path, compiler, notifier.as_ref(), &token)
                .await
        });

        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Save handler failed: {e}");
                None
            }
        }
    }

    /// Reload the owning workspace when `path` is a project configuration
    /// file. Returns false, doing nothing, for any other file.
    pub async fn reload_project_file(&self, path: &Utf8Path) -> bool {
        if !is_project_file(path) {
            return false;
        }
        if let Some(workspace) = self.workspace_for(path) {
            tracing::info!(path = %path, "configuration changed");
            workspace.reload().await;
        }
        true
    }

    /// Reload the configuration of every open workspace.
    pub async fn reload_all(&self) {
        for workspace in self.snapshot().iter() {
            workspace.reload().await;
        }
    }

    /// Stop accepting saves and dispose every workspace.
    pub fn shutdown(&self) {
        self.token.cancel();
        let workspaces = self.update(std::mem::take);
        for workspace in workspaces {
            workspace.dispose();
        }
    }
}
