//! Per-workspace configuration snapshots.
//!
//! A [`ConfigStore`] owns the current [`Settings`] for one root and replaces
//! it wholesale on reload. Reloads never overlap: a request arriving while
//! one is running marks a single pending retry, which the running reload
//! picks up after [`RETRY_DELAY`]. Any number of requests during one run
//! collapse into that one retry.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use perc_conf::ConfigError;
use perc_conf::Settings;

/// Delay before a deferred reload runs.
pub const RETRY_DELAY: Duration = Duration::from_millis(1);

/// Where configuration snapshots come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self, root: &Utf8Path) -> Result<Settings, ConfigError>;
}

/// Reads the user and project configuration files only.
pub struct FileConfigSource;

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn fetch(&self, root: &Utf8Path) -> Result<Settings, ConfigError> {
        let root = root.to_owned();
        tokio::task::spawn_blocking(move || Settings::new(&root, None))
            .await
            .map_err(|e| ConfigError::Host(e.to_string()))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReloadState {
    Idle,
    Loading { pending: bool },
}

pub struct ConfigStore {
    root: Utf8PathBuf,
    source: Arc<dyn ConfigSource>,
    snapshot: RwLock<Option<Arc<Settings>>>,
    state: Mutex<ReloadState>,
}

impl ConfigStore {
    #[must_use]
    pub fn new(root: Utf8PathBuf, source: Arc<dyn ConfigSource>) -> Self {
        Self {
            root,
            source,
            snapshot: RwLock::new(None),
            state: Mutex::new(ReloadState::Idle),
        }
    }

    /// The last successfully loaded snapshot, `None` before the first load.
    #[must_use]
    pub fn current_config(&self) -> Option<Arc<Settings>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch a fresh snapshot and swap it in.
    ///
    /// Returns immediately when another reload is running; that reload will
    /// run once more on this caller's behalf. A failed fetch is logged and
    /// the previous snapshot stays in place.
    pub async fn reload(&self) {
        if !self.begin() {
            tracing::trace!(root = %self.root, "reload deferred");
            return;
        }

        loop {
            self.load_once().await;
            if !self.finish() {
                break;
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ReloadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `Loading`, or record a pending retry. True if the caller runs.
    fn begin(&self) -> bool {
        let mut state = self.lock_state();
        match *state {
            ReloadState::Idle => {
                *state = ReloadState::Loading { pending: false };
                true
            }
            ReloadState::Loading { .. } => {
                *state = ReloadState::Loading { pending: true };
                false
            }
        }
    }

    /// Leave `Loading`, unless a retry is pending. True if it is.
    fn finish(&self) -> bool {
        let mut state = self.lock_state();
        match *state {
            ReloadState::Loading { pending: true } => {
                *state = ReloadState::Loading { pending: false };
                true
            }
            ReloadState::Loading { pending: false } | ReloadState::Idle => {
                *state = ReloadState::Idle;
                false
            }
        }
    }

    async fn load_once(&self) {
        match self.source.fetch(&self.root).await {
            Ok(settings) => {
                tracing::debug!(root = %self.root, "configuration reloaded");
                *self
                    .snapshot
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(settings));
            }
            Err(e) => {
                tracing::warn!(root = %self.root, "Keeping previous configuration: {e}");
            }
        }
    }
}
