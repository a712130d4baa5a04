use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures inside one compile-and-emit run.
///
/// None of these escape the save handler; they are rendered once for the
/// user and the watcher carries on.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Syntax { path: Utf8PathBuf, message: String },

    #[error("Refusing to compile {path} onto itself")]
    OutputCollision { path: Utf8PathBuf },

    #[error("Failed to generate source map for {path}: {reason}")]
    SourceMap { path: Utf8PathBuf, reason: String },

    #[error("Compiler unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Compiler bridge failed: {reason}")]
    Bridge { reason: String },
}

impl CompileError {
    /// Single-line rendering for notification channels.
    #[must_use]
    pub fn to_single_line(&self) -> String {
        self.to_string()
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_collapses_code_frames() {
        let err = CompileError::Syntax {
            path: Utf8PathBuf::from("/ws/a.coffee"),
            message: "1:5: error: unexpected end of input\nx = \n    ^".to_string(),
        };
        assert_eq!(
            err.to_single_line(),
            "/ws/a.coffee: 1:5: error: unexpected end of input x =     ^"
        );
    }

    #[test]
    fn test_write_error_display() {
        let err = CompileError::Write {
            path: Utf8PathBuf::from("/ws/a.js"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to write /ws/a.js: denied");
    }
}
