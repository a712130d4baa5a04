/// Tag every user-facing error message starts with.
pub const ERROR_TAG: &str = "[percolate]";

/// User-facing notification channel.
pub trait Notifier: Send + Sync {
    /// Show a single-line error to the user. Fire and forget.
    fn show_error(&self, message: &str);
}

/// Notifier for hosts without a UI: errors go to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
