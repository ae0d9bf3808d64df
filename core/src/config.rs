//! Application configuration.
//!
//! A small YAML document (JSON works too, being a YAML subset) that names
//! schema files and sets help and logging defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! log_level: warn
//! help:
//!   show_meta_properties: true
//! schemas:
//!   runtime: schemas/runtime.json
//!   code-snippet: schemas/code-snippet.json
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::help::HelpConfig;
use crate::ingest::LogLevel;

/// Top-level configuration.
///
/// Every field is optional in the file; missing ones take their defaults.
///
/// # Examples
///
/// ```
/// use schema_options_core::{AppConfig, LogLevel};
///
/// let config: AppConfig = serde_yaml::from_str("log_level: debug").unwrap();
/// assert_eq!(config.log_level, LogLevel::Debug);
/// assert!(!config.help.show_meta_properties);
/// assert!(config.schemas.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Verbosity used when no `--debug` or `--log-level` token is given.
    pub log_level: LogLevel,
    /// Help display settings.
    pub help: HelpConfig,
    /// Schema files selectable by name.
    pub schemas: BTreeMap<String, PathBuf>,
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::OptionError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::OptionError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Path of the schema registered under `name`.
    pub fn schema_path(&self, name: &str) -> Option<&Path> {
        self.schemas.get(name).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
log_level: WARNING
help:
  show_meta_properties: true
schemas:
  runtime: /etc/schemas/runtime.json
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.help.show_meta_properties);
        assert_eq!(
            config.schema_path("runtime"),
            Some(Path::new("/etc/schemas/runtime.json"))
        );
        assert!(config.schema_path("missing").is_none());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);

        let config: AppConfig = serde_yaml::from_str("log_level: INFO").unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(serde_yaml::from_str::<AppConfig>("log_level: loud").is_err());
    }

    #[test]
    fn test_json_document_is_accepted() {
        let config: AppConfig =
            serde_yaml::from_str(r#"{"help": {"show_meta_properties": true}}"#).unwrap();
        assert!(config.help.show_meta_properties);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let config: AppConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load("/does/not/exist.yml").unwrap_err();
        assert!(matches!(err, crate::OptionError::Io(_)));
    }
}
