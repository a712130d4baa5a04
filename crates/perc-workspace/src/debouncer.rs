//! Collapse bursts of change events per path.
//!
//! Editors often write a file several times per save (truncate, write,
//! rename). A path is released only once it has been quiet for the
//! configured duration.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use camino::Utf8PathBuf;

#[derive(Debug)]
pub struct Debouncer {
    pending: HashMap<Utf8PathBuf, Instant>,
    duration: Duration,
}

impl Debouncer {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            duration,
        }
    }

    /// Record a change, restarting the quiet period for `path`.
    pub fn record(&mut self, path: Utf8PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    pub fn forget(&mut self, path: &Utf8PathBuf) {
        self.pending.remove(path);
    }

    /// Remove and return every path that has been quiet long enough.
    pub fn take_ready(&mut self) -> Vec<Utf8PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();
        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
