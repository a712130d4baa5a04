use std::str::FromStr;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use tower_lsp_server::ls_types;
use url::Url;

pub(crate) trait UriExt {
    /// Convert `Utf8Path` to LSP Uri
    fn from_path(path: &Utf8Path) -> Option<Self>
    where
        Self: Sized;

    /// Convert a `file://` URI to a `Utf8PathBuf`
    fn to_utf8_path_buf(&self) -> Option<Utf8PathBuf>;
}

impl UriExt for ls_types::Uri {
    fn from_path(path: &Utf8Path) -> Option<Self> {
        let url = Url::from_file_path(path.as_std_path()).ok()?;
        ls_types::Uri::from_str(url.as_str()).ok()
    }

    fn to_utf8_path_buf(&self) -> Option<Utf8PathBuf> {
        let url = Url::parse(self.as_str()).ok()?;
        if url.scheme() != "file" {
            tracing::trace!(
                "URI conversion to path failed for: {} (non-file scheme)",
                self.as_str()
            );
            return None;
        }

        let path = url.to_file_path().ok()?;
        Utf8PathBuf::from_path_buf(path)
            .inspect_err(|_| {
                tracing::trace!(
                    "URI conversion to path failed for: {} (non-UTF-8 path)",
                    self.as_str()
                );
            })
            .ok()
    }
}
