use camino::Utf8Path;
use camino::Utf8PathBuf;

use crate::error::CompileError;

/// Paths involved in compiling one saved file.
///
/// Built per save event, executed once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    source: Utf8PathBuf,
    output: Utf8PathBuf,
    source_map: Utf8PathBuf,
}

impl CompileRequest {
    /// Derive the `.js` output and `.js.map` paths next to `source`.
    ///
    /// A source with a `.js` extension in any case is rejected, since on a
    /// case-insensitive filesystem `a.JS` and `a.js` are the same file.
    pub fn new(source: Utf8PathBuf) -> Result<Self, CompileError> {
        if source
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("js"))
        {
            return Err(CompileError::OutputCollision { path: source });
        }
        let output = source.with_extension("js");
        let source_map = Utf8PathBuf::from(format!("{output}.map"));
        Ok(Self {
            source,
            output,
            source_map,
        })
    }

    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    #[must_use]
    pub fn output(&self) -> &Utf8Path {
        &self.output
    }

    #[must_use]
    pub fn source_map(&self) -> &Utf8Path {
        &self.source_map
    }

    #[must_use]
    pub fn source_file_name(&self) -> &str {
        self.source.file_name().unwrap_or(self.source.as_str())
    }

    #[must_use]
    pub fn output_file_name(&self) -> &str {
        self.output.file_name().unwrap_or(self.output.as_str())
    }

    #[must_use]
    pub fn source_map_file_name(&self) -> &str {
        self.source_map
            .file_name()
            .unwrap_or(self.source_map.as_str())
    }
}
