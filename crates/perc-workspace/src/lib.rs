mod debouncer;
pub mod matcher;
mod notifier;
pub mod paths;
mod registry;
mod store;
mod watcher;
mod workspace;

pub use crate::matcher::matches;
pub use crate::matcher::PathMatcher;
pub use crate::notifier::Notifier;
pub use crate::notifier::TracingNotifier;
pub use crate::notifier::ERROR_TAG;
pub use crate::registry::WorkspaceRegistry;
pub use crate::store::ConfigSource;
pub use crate::store::ConfigStore;
pub use crate::store::FileConfigSource;
pub use crate::store::RETRY_DELAY;
pub use crate::watcher::FileWatcher;
pub use crate::watcher::WatchConfig;
pub use crate::watcher::WatchEvent;
pub use crate::watcher::WatchHost;
pub use crate::watcher::DEFAULT_DEBOUNCE;
pub use crate::workspace::Lifecycle;
pub use crate::workspace::SaveOutcome;
pub use crate::workspace::SkipReason;
pub use crate::workspace::Workspace;
