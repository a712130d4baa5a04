pub mod flags;
pub mod patterns;

use std::path::Path;

use camino::Utf8Path;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

pub use crate::flags::deep_merge;
pub use crate::flags::CompilerFlags;
pub use crate::patterns::PatternList;

/// Section name the editor host stores our settings under.
pub const SECTION: &str = "percolate";

/// Include pattern used when `files` is empty.
pub const DEFAULT_INCLUDE: &str = "**/*.coffee";

/// Project-level configuration files, lowest priority first.
pub const PROJECT_FILES: [&str; 2] = [".percolate.json", "percolate.json"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error: {0}")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to serialize client settings: {0}")]
    ClientSettings(#[from] serde_json::Error),
    #[error("Configuration host request failed: {0}")]
    Host(String),
}

/// Immutable configuration snapshot for one workspace.
///
/// A snapshot is produced whole by [`Settings::new`] and replaced whole on
/// reload; nothing mutates it in place.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    is_active: bool,
    files: PatternList,
    exclude: PatternList,
    bare: bool,
    header: bool,
    inline_map: bool,
    source_map: bool,
    options: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let flags = CompilerFlags::default();
        Self {
            is_active: true,
            files: PatternList::default(),
            exclude: PatternList::default(),
            bare: flags.bare,
            header: flags.header,
            inline_map: flags.inline_map,
            source_map: flags.source_map,
            options: Map::new(),
        }
    }
}

impl Settings {
    /// Load the layered configuration for `project_root`.
    ///
    /// Layers, lowest priority first: the user config file, the project
    /// files in [`PROJECT_FILES`], then `client` (the section the editor
    /// host reported for this folder), if any.
    pub fn new(project_root: &Utf8Path, client: Option<&Value>) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("dev", "percolate", "percolate")
            .map(|proj_dirs| proj_dirs.config_dir().join("settings.json"));

        Self::load_from_paths(project_root, user_config_file.as_deref(), client)
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Path>,
        client: Option<&Value>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Json).required(false));
        }

        for name in PROJECT_FILES {
            builder = builder.add_source(
                File::from(project_root.join(name).as_std_path())
                    .format(FileFormat::Json)
                    .required(false),
            );
        }

        // Hosts answer `null` for sections they know nothing about.
        if let Some(section) = client.filter(|value| value.is_object()) {
            let json = serde_json::to_string(section)?;
            builder = builder.add_source(File::from_str(&json, FileFormat::Json));
        }

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        tracing::trace!(root = %project_root, ?settings, "loaded settings");
        Ok(settings)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Include patterns, with the catch-all default substituted when empty.
    #[must_use]
    pub fn include_patterns(&self) -> Vec<String> {
        if self.files.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            self.files.as_slice().to_vec()
        }
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        self.exclude.as_slice()
    }

    #[must_use]
    pub fn flags(&self) -> CompilerFlags {
        CompilerFlags {
            bare: self.bare,
            header: self.header,
            inline_map: self.inline_map,
            source_map: self.source_map,
        }
    }

    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Option set handed to the compiler: named flags, user options on top.
    #[must_use]
    pub fn compiler_options(&self) -> Map<String, Value> {
        self.flags().merge_options(&self.options)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use serde_json::json;
    use tempfile::tempdir;
    use tempfile::TempDir;

    use super::*;

    fn project() -> (TempDir, Utf8PathBuf) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_load_no_files() {
            let (_dir, root) = project();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert_eq!(settings, Settings::default());
        }

        #[test]
        fn test_default_values() {
            let settings = Settings::default();
            assert!(settings.is_active());
            assert_eq!(settings.include_patterns(), vec![DEFAULT_INCLUDE.to_string()]);
            assert!(settings.exclude_patterns().is_empty());
            assert_eq!(settings.flags(), CompilerFlags::default());
            assert!(settings.options().is_empty());
        }

        #[test]
        fn test_empty_files_defaults_to_catch_all() {
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), r#"{"files": []}"#).unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert_eq!(settings.include_patterns(), vec!["**/*.coffee".to_string()]);
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn test_load_percolate_json() {
            let (_dir, root) = project();
            fs::write(
                root.join("percolate.json"),
                r#"{"files": "src/**", "exclude": ["src/vendor/**"], "bare": true}"#,
            )
            .unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert_eq!(settings.include_patterns(), vec!["src/**".to_string()]);
            assert_eq!(settings.exclude_patterns(), ["src/vendor/**".to_string()]);
            assert!(settings.flags().bare);
        }

        #[test]
        fn test_camel_case_keys() {
            let (_dir, root) = project();
            fs::write(
                root.join(".percolate.json"),
                r#"{"isActive": false, "inlineMap": true, "sourceMap": false}"#,
            )
            .unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert!(!settings.is_active());
            assert!(settings.flags().inline_map);
            assert!(!settings.flags().source_map);
        }

        #[test]
        fn test_options_pass_through() {
            let (_dir, root) = project();
            fs::write(
                root.join("percolate.json"),
                r#"{"options": {"bare": true, "literate": false}}"#,
            )
            .unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            let options = settings.compiler_options();
            assert_eq!(options.get("bare"), Some(&json!(true)));
            assert_eq!(options.get("literate"), Some(&json!(false)));
            assert_eq!(options.get("sourceMap"), Some(&json!(true)));
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn test_plain_file_overrides_dotfile() {
            let (_dir, root) = project();
            fs::write(root.join(".percolate.json"), r#"{"bare": false}"#).unwrap();
            fs::write(root.join("percolate.json"), r#"{"bare": true}"#).unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert!(settings.flags().bare);
        }

        #[test]
        fn test_project_overrides_user() {
            let user_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("settings.json");
            fs::write(&user_conf_path, r#"{"header": true, "bare": true}"#).unwrap();
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), r#"{"bare": false}"#).unwrap();

            let settings =
                Settings::load_from_paths(&root, Some(&user_conf_path), None).unwrap();
            assert!(!settings.flags().bare);
            assert!(settings.flags().header);
        }

        #[test]
        fn test_client_overrides_project() {
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), r#"{"sourceMap": true}"#).unwrap();
            let client = json!({"sourceMap": false});

            let settings = Settings::load_from_paths(&root, None, Some(&client)).unwrap();
            assert!(!settings.flags().source_map);
        }

        #[test]
        fn test_null_client_section_is_ignored() {
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), r#"{"bare": true}"#).unwrap();

            let settings =
                Settings::load_from_paths(&root, None, Some(&Value::Null)).unwrap();
            assert!(settings.flags().bare);
        }

        #[test]
        fn test_missing_user_file_is_skipped() {
            let user_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("settings.json");
            let (_dir, root) = project();

            let settings =
                Settings::load_from_paths(&root, Some(&user_conf_path), None).unwrap();
            assert_eq!(settings, Settings::default());
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_invalid_json_content() {
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), "{ not json").unwrap();
            let result = Settings::load_from_paths(&root, None, None);
            assert!(matches!(result.unwrap_err(), ConfigError::Config(_)));
        }

        #[test]
        fn test_null_pattern_lists_fall_back_to_defaults() {
            let (_dir, root) = project();
            fs::write(
                root.join("percolate.json"),
                r#"{"files": null, "exclude": null, "bare": true}"#,
            )
            .unwrap();
            let settings = Settings::load_from_paths(&root, None, None).unwrap();
            assert_eq!(settings.include_patterns(), vec![DEFAULT_INCLUDE.to_string()]);
            assert!(settings.exclude_patterns().is_empty());
            assert!(settings.flags().bare);
        }

        #[test]
        fn test_wrong_type() {
            let (_dir, root) = project();
            fs::write(root.join("percolate.json"), r#"{"files": {"a": 1}}"#).unwrap();
            assert!(Settings::load_from_paths(&root, None, None).is_err());
        }
    }
}
