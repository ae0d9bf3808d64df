//! Schema compiler.
//!
//! Turns a JSON-Schema `properties` tree into a flat [`OptionSet`] keyed by
//! dotted name. Object-valued properties are flattened recursively; the
//! container literally named `metadata` contributes no prefix of its own, so
//! `metadata.auth.user` surfaces as `--auth.user`.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{OptionError, Result};
use crate::types::{CliOption, OptionSet};

/// Container whose children are flattened without a prefix.
pub const METADATA_CONTAINER: &str = "metadata";

/// Property represented by a built-in option, never compiled from the schema.
pub const SCHEMA_NAME_PROPERTY: &str = "schema_name";

/// Compiles a schema into its option set.
///
/// Top-level properties become [`OptionKind::SchemaProperty`] options and
/// everything nested below becomes [`OptionKind::MetadataSchemaProperty`].
/// Names listed in a fragment's `required` array are marked required.
///
/// [`OptionKind::SchemaProperty`]: crate::OptionKind::SchemaProperty
/// [`OptionKind::MetadataSchemaProperty`]: crate::OptionKind::MetadataSchemaProperty
///
/// # Examples
///
/// ```
/// use schema_options_core::schema_to_options;
/// use serde_json::json;
///
/// let schema = json!({
///     "properties": {
///         "schema_name": {"type": "string"},
///         "display_name": {"type": "string"},
///         "metadata": {
///             "type": "object",
///             "properties": {
///                 "api_endpoint": {"type": "string"},
///                 "auth": {
///                     "type": "object",
///                     "properties": {"user": {"type": "string"}},
///                     "required": ["user"]
///                 }
///             },
///             "required": ["api_endpoint"]
///         }
///     },
///     "required": ["schema_name", "display_name", "metadata"]
/// });
///
/// let options = schema_to_options(&schema).unwrap();
/// let keys: Vec<&str> = options.keys().collect();
/// assert_eq!(keys, ["display_name", "api_endpoint", "auth.user"]);
/// assert!(options.get("auth.user").unwrap().required);
/// assert!(!options.contains("schema_name"));
/// ```
pub fn schema_to_options(schema: &Value) -> Result<OptionSet> {
    compile_fragment(schema, 0, None, &[])
}

/// Reads a schema document from a JSON file.
pub fn load_schema(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        OptionError::InvalidInput(format!("unable to read schema '{}': {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        OptionError::InvalidInput(format!("schema '{}' is not valid JSON: {e}", path.display()))
    })
}

fn compile_fragment(
    schema: &Value,
    level: usize,
    prefix: Option<&str>,
    path: &[String],
) -> Result<OptionSet> {
    let mut options = OptionSet::new();

    let Some(properties) = schema.get("properties") else {
        // An object-valued property without declared properties is a single option.
        let name = prefix.ok_or_else(|| {
            OptionError::InvalidSchema("schema does not declare any properties".to_string())
        })?;
        options.insert(CliOption::metadata_schema_property(name, schema).at_path(path.to_vec()));
        return Ok(options);
    };

    let properties = properties.as_object().ok_or_else(|| {
        OptionError::InvalidSchema(format!(
            "'properties' of '{}' must be an object",
            prefix.unwrap_or("<root>")
        ))
    })?;

    for (key, fragment) in properties {
        if key == SCHEMA_NAME_PROPERTY {
            continue;
        }
        if !fragment.is_object() {
            return Err(OptionError::InvalidSchema(format!(
                "property '{key}' must be an object"
            )));
        }

        let name = prefixed_name(prefix, key);
        let mut child_path = path.to_vec();
        child_path.push(key.clone());

        if fragment.get("type").and_then(Value::as_str) == Some("object") {
            options.extend(compile_fragment(fragment, level + 1, Some(&name), &child_path)?);
            continue;
        }

        let option = if level == 0 {
            CliOption::schema_property(&name, fragment)
        } else {
            CliOption::metadata_schema_property(&name, fragment)
        };

        debug!(option = %name, level, value_type = %option.value_type, "compiled schema property");
        options.insert(option.at_path(child_path));
    }

    for required in required_names(schema)? {
        if required == SCHEMA_NAME_PROPERTY || required == METADATA_CONTAINER {
            continue;
        }
        let name = prefixed_name(prefix, required);
        options
            .get_mut(&name)
            .ok_or_else(|| OptionError::UndeclaredRequired(name.clone()))?
            .required = true;
    }

    Ok(options)
}

/// Dotted name of `key` under `prefix`; the metadata container adds nothing.
pub(crate) fn prefixed_name(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if prefix != METADATA_CONTAINER => format!("{prefix}.{key}"),
        _ => key.to_string(),
    }
}

fn required_names(schema: &Value) -> Result<Vec<&str>> {
    let Some(required) = schema.get("required") else {
        return Ok(Vec::new());
    };
    let entries = required
        .as_array()
        .ok_or_else(|| OptionError::InvalidSchema("'required' must be an array".to_string()))?;
    entries
        .iter()
        .map(|entry| {
            entry.as_str().ok_or_else(|| {
                OptionError::InvalidSchema(format!("required entry {entry} is not a string"))
            })
        })
        .collect()
}
