//! Filesystem host: turns on-disk writes into save events.
//!
//! Used when no editor is driving the registry. Writes under the watched
//! roots are debounced and dispatched as saves; edits to a project
//! configuration file reload the owning workspace instead. Files this
//! process emitted are remembered and never fed back into the pipeline.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use notify::Config;
use notify::Event;
use notify::EventKind;
use notify::RecommendedWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use perc_compile::EmitOutcome;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::debouncer::Debouncer;
use crate::registry::WorkspaceRegistry;
use crate::workspace::SaveOutcome;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// How often settled paths are collected.
const TICK: Duration = Duration::from_millis(25);

#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent {
    Created(Utf8PathBuf),
    Modified(Utf8PathBuf),
    Deleted(Utf8PathBuf),
}

#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Directories watched recursively.
    pub roots: Vec<Utf8PathBuf>,
    pub debounce: Duration,
}

impl WatchConfig {
    #[must_use]
    pub fn new(roots: Vec<Utf8PathBuf>) -> Self {
        Self {
            roots,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Recursive watcher over a set of roots, delivering [`WatchEvent`]s.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<WatchEvent>,
}

impl FileWatcher {
    pub fn new(roots: &[Utf8PathBuf]) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for watch_event in convert_notify_event(event) {
                        let _ = tx.send(watch_event);
                    }
                }
                Err(e) => tracing::warn!("File watcher error: {e}"),
            },
            Config::default(),
        )?;

        for root in roots {
            watcher.watch(root.as_std_path(), RecursiveMode::Recursive)?;
            tracing::info!(root = %root, "watching");
        }

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next event, or `None` once the underlying watcher is gone.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }
}

fn convert_notify_event(event: Event) -> Vec<WatchEvent> {
    let kind = event.kind;
    event
        .paths
        .into_iter()
        .filter_map(|path| Utf8PathBuf::try_from(path).ok())
        .filter_map(|path| match kind {
            EventKind::Create(_) => Some(WatchEvent::Created(path)),
            EventKind::Modify(_) => Some(WatchEvent::Modified(path)),
            EventKind::Remove(_) => Some(WatchEvent::Deleted(path)),
            _ => None,
        })
        .collect()
}

/// Drives a [`WorkspaceRegistry`] from filesystem events.
pub struct WatchHost {
    registry: Arc<WorkspaceRegistry>,
    emitted: HashSet<Utf8PathBuf>,
}

impl WatchHost {
    #[must_use]
    pub fn new(registry: Arc<WorkspaceRegistry>) -> Self {
        Self {
            registry,
            emitted: HashSet::new(),
        }
    }

    /// Watch `config.roots` until `token` is cancelled.
    pub async fn run(mut self, config: WatchConfig, token: CancellationToken) -> Result<()> {
        let mut watcher = FileWatcher::new(&config.roots)?;
        let mut debouncer = Debouncer::new(config.debounce);
        let mut tick = tokio::time::interval(TICK);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                event = watcher.recv() => match event {
                    Some(WatchEvent::Created(path) | WatchEvent::Modified(path)) => {
                        debouncer.record(path);
                    }
                    Some(WatchEvent::Deleted(path)) => debouncer.forget(&path),
                    None => break,
                },
                _ = tick.tick(), if debouncer.has_pending() => {
                    for path in debouncer.take_ready() {
                        self.handle_change(&path).await;
                    }
                }
            }
        }

        tracing::info!("watcher stopped");
        Ok(())
    }

    /// React to one settled change under a watched root.
    pub async fn handle_change(&mut self, path: &Utf8Path) -> Option<SaveOutcome> {
        if self.emitted.contains(path) {
            tracing::trace!(path = %path, "ignoring emitted artifact");
            return None;
        }

        if self.registry.reload_project_file(path).await {
            return None;
        }

        if !path.is_file() {
            return None;
        }

        let outcome = self.registry.dispatch_save(path).await;
        if let Some(SaveOutcome::Emitted(EmitOutcome::Written { output, source_map })) = &outcome {
            self.emitted.insert(output.clone());
            if let Some(map) = source_map {
                self.emitted.insert(map.clone());
            }
        }
        outcome
    }
}
