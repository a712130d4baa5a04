use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use perc_compile::emit;
use perc_compile::CompileError;
use perc_compile::CompileRequest;
use perc_compile::Compiler;
use perc_compile::EmitOutcome;
use perc_conf::Settings;
use tokio_util::sync::CancellationToken;

use crate::matcher::PathMatcher;
use crate::notifier::Notifier;
use crate::notifier::ERROR_TAG;
use crate::paths::normalize;
use crate::paths::to_relative_path;
use crate::store::ConfigSource;
use crate::store::ConfigStore;

/// Where a workspace is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Disposing,
    Disposed,
}

/// Why a save produced no compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not initialized yet, being disposed, or the host is shutting down.
    NotLive,
    /// No configuration snapshot has loaded yet.
    Unconfigured,
    /// `isActive` is false.
    Inactive,
    NotContained,
    NotMatched,
    /// The file is its own output (a `.js` file).
    OwnOutput,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    Emitted(EmitOutcome),
    /// The failure was already reported through the notifier.
    Failed,
}

/// One root directory with its own configuration and lifecycle.
pub struct Workspace {
    root: Utf8PathBuf,
    store: ConfigStore,
    lifecycle: RwLock<Lifecycle>,
}

impl Workspace {
    #[must_use]
    pub fn new(root: &Utf8Path, source: Arc<dyn ConfigSource>) -> Self {
        let root = normalize(root);
        Self {
            store: ConfigStore::new(root.clone(), source),
            root,
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *self
            .lifecycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the workspace may still produce side effects.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lifecycle() == Lifecycle::Initialized
    }

    #[must_use]
    pub fn current_config(&self) -> Option<Arc<Settings>> {
        self.store.current_config()
    }

    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        to_relative_path(&self.root, path).is_some()
    }

    /// Perform the first configuration load and open for save events.
    pub async fn initialize(&self) {
        self.store.reload().await;
        let mut lifecycle = self
            .lifecycle
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if *lifecycle == Lifecycle::Uninitialized {
            *lifecycle = Lifecycle::Initialized;
            tracing::info!(root = %self.root, "workspace initialized");
        }
    }

    pub async fn reload(&self) {
        if matches!(self.lifecycle(), Lifecycle::Disposing | Lifecycle::Disposed) {
            return;
        }
        self.store.reload().await;
    }

    /// Stop producing side effects. Compiles already running observe this
    /// before their next write.
    pub fn dispose(&self) {
        self.set_lifecycle(Lifecycle::Disposing);
        self.set_lifecycle(Lifecycle::Disposed);
        tracing::info!(root = %self.root, "workspace disposed");
    }

    fn set_lifecycle(&self, next: Lifecycle) {
        *self
            .lifecycle
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Compile `path` if this workspace's configuration selects it.
    ///
    /// Never fails: compile errors are reported once through `notifier` and
    /// folded into [`SaveOutcome::Failed`].
    pub async fn handle_save(
        self: &Arc<Self>,
        path: &Utf8Path,
        compiler: Arc<dyn Compiler>,
        notifier: &dyn Notifier,
        token: &CancellationToken,
    ) -> SaveOutcome {
        let (request, settings) = match self.prepare(path, token) {
            Ok(prepared) => prepared,
            Err(reason) => {
                tracing::trace!(path = %path, ?reason, "save skipped");
                return SaveOutcome::Skipped(reason);
            }
        };

        let workspace = Arc::clone(self);
        let token = token.clone();
        let result = tokio::task::spawn_blocking(move || {
            let is_live = || workspace.is_live() && !token.is_cancelled();
            emit(&request, compiler.as_ref(), &settings, &is_live)
        })
        .await;

        match result {
            Ok(Ok(EmitOutcome::Abandoned)) => {
                tracing::debug!(path = %path, "compile abandoned");
                SaveOutcome::Emitted(EmitOutcome::Abandoned)
            }
            Ok(Ok(outcome)) => SaveOutcome::Emitted(outcome),
            Ok(Err(e)) => {
                report(notifier, &e);
                SaveOutcome::Failed
            }
            Err(e) => {
                tracing::error!(path = %path, "Compile task failed: {e}");
                notifier.show_error(&format!("{ERROR_TAG} Compiling {path} failed: {e}"));
                SaveOutcome::Failed
            }
        }
    }

    fn prepare(
        &self,
        path: &Utf8Path,
        token: &CancellationToken,
    ) -> Result<(CompileRequest, Arc<Settings>), SkipReason> {
        if !self.is_live() || token.is_cancelled() {
            return Err(SkipReason::NotLive);
        }
        let settings = self.current_config().ok_or(SkipReason::Unconfigured)?;
        if !settings.is_active() {
            return Err(SkipReason::Inactive);
        }

        let relative = to_relative_path(&self.root, path).ok_or(SkipReason::NotContained)?;
        let matcher = PathMatcher::new(&settings.include_patterns(), settings.exclude_patterns());
        if !matcher.is_match(&relative) {
            return Err(SkipReason::NotMatched);
        }

        let request = CompileRequest::new(normalize(path)).map_err(|_| SkipReason::OwnOutput)?;
        Ok((request, settings))
    }
}

fn report(notifier: &dyn Notifier, error: &CompileError) {
    tracing::error!("{error}");
    notifier.show_error(&format!("{ERROR_TAG} {}", error.to_single_line()));
}
