use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use camino::Utf8Path;
use perc_conf::ConfigError;
use perc_conf::Settings;
use perc_conf::SECTION;
use perc_workspace::ConfigSource;
use perc_workspace::Notifier;
use serde_json::Value;
use tower_lsp_server::ls_types::ConfigurationItem;
use tower_lsp_server::ls_types::MessageType;
use tower_lsp_server::ls_types::Uri;
use tower_lsp_server::Client;

use crate::ext::UriExt;

/// Shows errors as `window/showMessage` popups.
pub struct ClientNotifier {
    client: Client,
}

impl ClientNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Notifier for ClientNotifier {
    fn show_error(&self, message: &str) {
        let client = self.client.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            client.show_message(MessageType::ERROR, message).await;
        });
    }
}

/// Layers the client's `percolate` section over the configuration files.
///
/// Until the client has declared `workspace/configuration` support only the
/// files are read.
pub struct ClientConfigSource {
    client: Client,
    supports_configuration: AtomicBool,
}

impl ClientConfigSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            supports_configuration: AtomicBool::new(false),
        }
    }

    pub fn set_supports_configuration(&self, supported: bool) {
        self.supports_configuration.store(supported, Ordering::Release);
    }

    async fn request_section(&self, root: &Utf8Path) -> Result<Option<Value>, ConfigError> {
        if !self.supports_configuration.load(Ordering::Acquire) {
            return Ok(None);
        }

        let item = ConfigurationItem {
            scope_uri: Uri::from_path(root),
            section: Some(SECTION.to_string()),
        };
        let mut values = self
            .client
            .configuration(vec![item])
            .await
            .map_err(|e| ConfigError::Host(e.to_string()))?;

        Ok(if values.is_empty() {
            None
        } else {
            Some(values.swap_remove(0))
        })
    }
}

#[async_trait]
impl ConfigSource for ClientConfigSource {
    async fn fetch(&self, root: &Utf8Path) -> Result<Settings, ConfigError> {
        let section = self.request_section(root).await?;
        let root = root.to_owned();
        tokio::task::spawn_blocking(move || Settings::new(&root, section.as_ref()))
            .await
            .map_err(|e| ConfigError::Host(e.to_string()))?
    }
}
