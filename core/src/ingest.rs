//! Argument ingestion.
//!
//! Splits a raw argument vector of `--name` / `--name=value` tokens into an
//! [`ArgumentState`]: the remaining vector plus a token → raw value mapping.
//! Control tokens (`--debug`, `--log-level=LEVEL`, `--file=PATH`) are applied
//! during the pass and never reach the mapping.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::compile::prefixed_name;
use crate::error::{OptionError, Result};
use crate::types::{insert_at_path, raw_text};

pub const DEBUG_TOKEN: &str = "--debug";
pub const LOG_LEVEL_TOKEN: &str = "--log-level";
pub const FILE_TOKEN: &str = "--file";
pub const HELP_TOKENS: [&str; 2] = ["--help", "-h"];

/// Logging verbosity requested on the command line or in configuration.
///
/// # Examples
///
/// ```
/// use schema_options_core::LogLevel;
///
/// assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
/// assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
/// assert!("loud".parse::<LogLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl TryFrom<String> for LogLevel {
    type Error = OptionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for LogLevel {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            _ => Err(OptionError::InvalidInput(format!("unknown log level '{s}'"))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// The argument vector and its token → raw value mapping.
///
/// Both views are kept consistent: consuming an option removes it from each.
/// Valueless tokens map to `null`; values from the command line are strings
/// and values loaded through `--file` keep their JSON types.
///
/// # Examples
///
/// ```
/// use schema_options_core::{ArgumentState, LogLevel};
/// use serde_json::json;
///
/// let state = ArgumentState::from_args(["--name=foo", "--replace", "--debug"]).unwrap();
/// assert_eq!(state.argv(), ["--name=foo", "--replace"]);
/// assert_eq!(state.get("--name"), Some(&json!("foo")));
/// assert_eq!(state.get("--replace"), Some(&json!(null)));
/// assert_eq!(state.log_level(), Some(LogLevel::Debug));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentState {
    argv: Vec<String>,
    mappings: Map<String, Value>,
    consumed: Map<String, Value>,
    log_level: Option<LogLevel>,
}

impl ArgumentState {
    /// Ingests an argument vector in a single left-to-right pass.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut state = Self::default();

        let mut controls = Vec::new();
        for (idx, arg) in argv.iter().enumerate() {
            let (option, value) = split_token(arg);
            match option {
                DEBUG_TOKEN => {
                    state.log_level = Some(LogLevel::Debug);
                    controls.push(idx);
                }
                LOG_LEVEL_TOKEN => {
                    let level = value.ok_or_else(|| {
                        OptionError::InvalidInput(format!("{LOG_LEVEL_TOKEN} requires a level"))
                    })?;
                    state.log_level = Some(level.parse()?);
                    controls.push(idx);
                }
                FILE_TOKEN => {
                    let path = value.ok_or_else(|| {
                        OptionError::InvalidInput(format!("{FILE_TOKEN} requires a path"))
                    })?;
                    state.load_file(Path::new(path))?;
                    controls.push(idx);
                }
                _ => {
                    let raw = value.map_or(Value::Null, |v| Value::String(v.to_string()));
                    state.mappings.insert(option.to_string(), raw);
                }
            }
        }

        state.argv = argv
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !controls.contains(idx))
            .map(|(_, arg)| arg)
            .collect();

        Ok(state)
    }

    /// Adds mapping entries from a JSON file, as if given on the command line.
    ///
    /// The file's base name (up to the first `.`) becomes the `--name` entry.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            OptionError::InvalidInput(format!("unable to read '{}': {e}", path.display()))
        })?;
        let data: Value = serde_json::from_str(&content).map_err(|e| {
            OptionError::InvalidInput(format!("'{}' is not valid JSON: {e}", path.display()))
        })?;
        let Value::Object(data) = data else {
            return Err(OptionError::InvalidInput(format!(
                "'{}' must contain a JSON object",
                path.display()
            )));
        };

        let instance_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .and_then(|n| n.split('.').next().map(String::from))
            .unwrap_or_default();
        self.mappings
            .insert("--name".to_string(), Value::String(instance_name));

        self.load_json(&data, None);
        debug!(path = %path.display(), keys = data.len(), "loaded arguments from file");
        Ok(())
    }

    /// Flattens a JSON object into dotted `--key` mapping entries.
    pub fn load_json(&mut self, data: &Map<String, Value>, prefix: Option<&str>) {
        for (key, value) in data {
            let name = prefixed_name(prefix, key);
            match value {
                Value::Object(child) => self.load_json(child, Some(&name)),
                _ => {
                    self.mappings.insert(format!("--{name}"), value.clone());
                }
            }
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn mappings(&self) -> &Map<String, Value> {
        &self.mappings
    }

    pub fn get(&self, token: &str) -> Option<&Value> {
        self.mappings.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.mappings.contains_key(token)
    }

    /// Level requested by `--debug` or `--log-level`, the last one winning.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// Whether a help token is present in the mapping.
    pub fn has_help(&self) -> bool {
        HELP_TOKENS.iter().any(|token| self.mappings.contains_key(*token))
    }

    /// Whether every argument has been consumed.
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty() && self.mappings.is_empty()
    }

    /// Tokens still waiting to be consumed: the vector, then any
    /// file-derived mapping entries that never appeared in it.
    pub fn leftovers(&self) -> Vec<String> {
        let mut leftovers = self.argv.clone();
        for (token, value) in &self.mappings {
            let entry = entry_text(token, value);
            if !self.argv.contains(&entry) {
                leftovers.push(entry);
            }
        }
        leftovers
    }

    /// First element of the vector.
    pub fn head(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Removes `token` from both the mapping and the vector.
    ///
    /// The vector entry is rebuilt from the mapping as `token` or
    /// `token=value`, exactly as it was typed.
    pub(crate) fn remove_entry(&mut self, token: &str) -> Result<()> {
        let value = self
            .mappings
            .shift_remove(token)
            .ok_or_else(|| OptionError::MissingArgument(token.to_string()))?;
        let entry = entry_text(token, &value);
        if let Some(idx) = self.argv.iter().position(|arg| *arg == entry) {
            self.argv.remove(idx);
        }
        self.consumed.insert(token.to_string(), value);
        Ok(())
    }

    /// Reassembles the `token.*` entries flattened out of a `--file` object.
    ///
    /// Returns `None` when no such entry exists. The entries stay in the
    /// mapping until [`remove_nested`](Self::remove_nested) is called.
    pub(crate) fn nested_object(&self, token: &str) -> Option<Value> {
        let prefix = format!("{token}.");
        let mut object = Map::new();
        for (key, value) in &self.mappings {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let path: Vec<String> = rest.split('.').map(String::from).collect();
            insert_at_path(&mut object, &path, value.clone());
        }
        (!object.is_empty()).then_some(Value::Object(object))
    }

    /// Removes every `token.*` entry, as consumed by a single object option.
    pub(crate) fn remove_nested(&mut self, token: &str) -> Result<()> {
        let prefix = format!("{token}.");
        let nested: Vec<String> = self
            .mappings
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in nested {
            self.remove_entry(&key)?;
        }
        Ok(())
    }

    /// Every entry the user supplied, consumed or not.
    pub(crate) fn supplied(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.mappings.iter().chain(self.consumed.iter())
    }
}

fn split_token(arg: &str) -> (&str, Option<&str>) {
    match arg.split_once('=') {
        Some((option, value)) => (option, Some(value)),
        None => (arg, None),
    }
}

fn entry_text(token: &str, value: &Value) -> String {
    match value {
        Value::Null => token.to_string(),
        other => format!("{token}={}", raw_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn write_json(dir: &Path, file_name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(file_name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_split_on_first_equals() {
        let state = ArgumentState::from_args(["--expr=a=b"]).unwrap();
        assert_eq!(state.get("--expr"), Some(&json!("a=b")));
    }

    #[test]
    fn test_log_level_token_is_removed() {
        let state =
            ArgumentState::from_args(["--log-level=WARNING", "--name=x", "--debug"]).unwrap();
        assert_eq!(state.argv(), ["--name=x"]);
        assert_eq!(state.log_level(), Some(LogLevel::Debug));
        assert!(!state.contains("--log-level"));
        assert!(!state.contains("--debug"));
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let err = ArgumentState::from_args(["--log-level=LOUD"]).unwrap_err();
        assert!(matches!(err, OptionError::InvalidInput(_)));
        assert!(ArgumentState::from_args(["--log-level"]).is_err());
    }

    #[test]
    fn test_file_entries_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            dir.path(),
            "meta.json",
            r#"{"display_name": "Meta", "metadata": {"count": 3, "auth": {"user": "u"}}}"#,
        );

        let arg = format!("--file={}", path.display());
        let state = ArgumentState::from_args([arg]).unwrap();

        assert!(state.argv().is_empty());
        assert_eq!(state.get("--name"), Some(&json!("meta")));
        assert_eq!(state.get("--display_name"), Some(&json!("Meta")));
        assert_eq!(state.get("--count"), Some(&json!(3)));
        assert_eq!(state.get("--auth.user"), Some(&json!("u")));
        assert!(!state.contains("--metadata.count"));
        assert!(!state.contains("--file"));
    }

    #[test]
    fn test_objects_outside_metadata_keep_their_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            dir.path(),
            "inst.json",
            r#"{"sub": {"x": 1, "inner": {"y": "z"}}, "metadata": {"sub": {"w": 2}}}"#,
        );
        let mut state = ArgumentState::default();
        state.load_file(&path).unwrap();

        assert_eq!(state.get("--sub.x"), Some(&json!(1)));
        assert_eq!(state.get("--sub.inner.y"), Some(&json!("z")));
        assert_eq!(state.get("--sub.w"), Some(&json!(2)));
        assert!(!state.contains("--x"));
        assert!(!state.contains("--inner.y"));
    }

    #[test]
    fn test_non_object_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "list.json", "[1, 2, 3]");
        let mut state = ArgumentState::default();

        let err = state.load_file(&path).unwrap_err();
        assert!(matches!(err, OptionError::InvalidInput(msg) if msg.contains("must contain a JSON object")));
        assert!(state.mappings().is_empty());
    }

    #[test]
    fn test_file_name_stops_at_first_dot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "my_runtime.v2.json", "{}");
        let mut state = ArgumentState::default();
        state.load_file(&path).unwrap();
        assert_eq!(state.get("--name"), Some(&json!("my_runtime")));
    }

    #[test]
    fn test_malformed_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "broken.json", "{\"a\": ");
        let arg = format!("--file={}", path.display());
        let err = ArgumentState::from_args([arg]).unwrap_err();
        assert!(matches!(err, OptionError::InvalidInput(_)));

        let err = ArgumentState::from_args(["--file=/does/not/exist.json"]).unwrap_err();
        assert!(matches!(err, OptionError::InvalidInput(_)));
    }

    #[test]
    fn test_remove_entry_rebuilds_exact_token() {
        let mut state = ArgumentState::from_args(["--a=", "--b", "--c=3"]).unwrap();
        state.remove_entry("--a").unwrap();
        state.remove_entry("--b").unwrap();
        assert_eq!(state.argv(), ["--c=3"]);
        assert_eq!(state.mappings().len(), 1);

        let err = state.remove_entry("--zzz").unwrap_err();
        assert!(matches!(err, OptionError::MissingArgument(_)));
    }

    #[test]
    fn test_has_help() {
        assert!(ArgumentState::from_args(["-h"]).unwrap().has_help());
        assert!(ArgumentState::from_args(["--x=1", "--help"]).unwrap().has_help());
        assert!(!ArgumentState::from_args(["--x=1"]).unwrap().has_help());
    }

    #[test]
    fn test_leftovers_include_unconsumed_file_entries() {
        let mut state = ArgumentState::from_args(["--x=1"]).unwrap();
        state.load_json(json!({"y": true}).as_object().unwrap(), None);
        assert_eq!(state.leftovers(), vec!["--x=1".to_string(), "--y=true".to_string()]);
    }
}
