//! Schema-driven command-line options.
//!
//! This crate compiles a JSON-Schema-shaped metadata definition into typed
//! command-line options and reconciles them against an argument vector:
//!
//! - [`schema_to_options`] flattens a schema's `properties` tree into an
//!   [`OptionSet`] of [`CliOption`]s keyed by dotted name.
//! - [`ArgumentState`] ingests `--name` / `--name=value` tokens (and
//!   `--file=PATH` JSON payloads) into a token → raw value mapping.
//! - [`ArgumentState::process_options`] coerces values, enforces required
//!   and one-of constraints, and rejects leftover arguments.
//! - [`App`] picks a subcommand from the head of the arguments.
//! - [`HelpConfig`] renders option help.
//!
//! Every failure is an [`OptionError`]; the caller decides how to report it
//! and which exit code to use.
//!
//! # Example
//!
//! ```
//! use schema_options_core::*;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "properties": {
//!         "display_name": {"type": "string", "description": "Display name"},
//!         "metadata": {
//!             "type": "object",
//!             "properties": {"port": {"type": "integer", "default": 80}},
//!             "required": ["port"]
//!         }
//!     },
//!     "required": ["display_name"]
//! });
//!
//! let mut options = schema_to_options(&schema).unwrap();
//! let mut state = ArgumentState::from_args(["--display_name=Web", "--port=8080"]).unwrap();
//! state.process_options(&mut options).unwrap();
//!
//! assert_eq!(
//!     options.to_instance(),
//!     json!({"display_name": "Web", "metadata": {"port": 8080}})
//! );
//! assert!(state.is_empty());
//! ```

mod compile;
mod config;
mod dispatch;
mod error;
mod help;
mod ingest;
mod resolve;
mod types;

pub use compile::{METADATA_CONTAINER, SCHEMA_NAME_PROPERTY, load_schema, schema_to_options};
pub use config::AppConfig;
pub use dispatch::{App, Subcommand};
pub use error::{OptionError, Result};
pub use help::{HelpConfig, SKIPPED_META_PROPERTIES};
pub use ingest::{
    ArgumentState, DEBUG_TOKEN, FILE_TOKEN, HELP_TOKENS, LOG_LEVEL_TOKEN, LogLevel,
};
pub use types::{CliOption, OptionKind, OptionSet, SchemaOrigin, ValueType, is_truthy};
