//! Option model: typed, CLI-addressable values and the sets they live in.
//!
//! A [`CliOption`] carries its wire token (`--name`), an optional dotted
//! schema name, a declared [`ValueType`] and the current value. Behavior that
//! differs between plain options, flags and schema-derived options is
//! dispatched on [`OptionKind`].

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{OptionError, Result};

/// Declared type of an option's value, as named by JSON Schema.
///
/// # Examples
///
/// ```
/// use schema_options_core::ValueType;
/// use serde_json::json;
///
/// assert_eq!(ValueType::from_schema(Some(&json!("integer"))), ValueType::Integer);
/// assert_eq!(ValueType::from_schema(None), ValueType::String);
/// assert_eq!(ValueType::Number.to_string(), "number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    /// Whole numbers from `i64::MIN` to `u64::MAX`; anything wider is a coercion error.
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    /// Anything else a schema may declare (unions, custom names). Stored verbatim.
    Other(String),
}

impl ValueType {
    /// Reads the `type` keyword of a schema fragment.
    pub fn from_schema(value: Option<&Value>) -> Self {
        match value {
            None => Self::String,
            Some(Value::String(name)) => Self::from_name(name),
            Some(other) => Self::Other(other.to_string()),
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            "null" => Self::Null,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a schema-derived option came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaOrigin {
    /// The property's schema fragment, kept for help metadata.
    pub fragment: Map<String, Value>,
    /// Full path of the property from the schema root, container names included.
    pub path: Vec<String>,
}

/// Kind discriminator for [`CliOption`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    /// A value-taking option declared by the application.
    Plain,
    /// A boolean option whose presence negates its default.
    Flag,
    /// A top-level schema property (`display_name` and friends).
    SchemaProperty(SchemaOrigin),
    /// A schema property nested inside the `metadata` container or a sub-object.
    MetadataSchemaProperty(SchemaOrigin),
}

/// A single named, typed, CLI-addressable value.
///
/// # Examples
///
/// ```
/// use schema_options_core::{CliOption, ValueType};
/// use serde_json::json;
///
/// let mut port = CliOption::new("--port", ValueType::Integer)
///     .with_description("Port to listen on")
///     .with_default(json!(8080));
/// assert_eq!(port.value, json!(8080));
///
/// port.set_value(&json!("9090")).unwrap();
/// assert_eq!(port.value, json!(9090));
/// assert!(port.set_value(&json!("ninety")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CliOption {
    token: String,
    kind: OptionKind,
    /// Dotted logical name for schema-derived options.
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_value: Value,
    /// Current value, seeded from the default.
    pub value: Value,
    pub value_type: ValueType,
    /// Allowed values, when constrained.
    pub one_of: Option<Vec<Value>>,
    pub required: bool,
    /// Set once the resolver has visited this option.
    pub processed: bool,
}

impl CliOption {
    /// Creates a value-taking option.
    pub fn new(token: &str, value_type: ValueType) -> Self {
        Self {
            token: token.to_string(),
            kind: OptionKind::Plain,
            name: None,
            description: None,
            default_value: Value::Null,
            value: Value::Null,
            value_type,
            one_of: None,
            required: false,
            processed: false,
        }
    }

    /// Creates a flag defaulting to `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_options_core::{CliOption, ValueType};
    ///
    /// let flag = CliOption::flag("--replace");
    /// assert!(flag.is_flag());
    /// assert_eq!(flag.value_type, ValueType::Boolean);
    /// assert_eq!(flag.value, serde_json::json!(false));
    /// ```
    pub fn flag(token: &str) -> Self {
        Self {
            kind: OptionKind::Flag,
            ..Self::new(token, ValueType::Boolean).with_default(Value::Bool(false))
        }
    }

    /// Creates a top-level schema property option named `name`.
    pub fn schema_property(name: &str, fragment: &Value) -> Self {
        let origin = SchemaOrigin::from_fragment(name, fragment);
        Self::from_origin(name, OptionKind::SchemaProperty(origin))
    }

    /// Creates a schema property option that lives inside a nested container.
    pub fn metadata_schema_property(name: &str, fragment: &Value) -> Self {
        let origin = SchemaOrigin::from_fragment(name, fragment);
        Self::from_origin(name, OptionKind::MetadataSchemaProperty(origin))
    }

    fn from_origin(name: &str, kind: OptionKind) -> Self {
        let (description, default, value_type) = match &kind {
            OptionKind::SchemaProperty(origin) | OptionKind::MetadataSchemaProperty(origin) => (
                origin
                    .fragment
                    .get("description")
                    .and_then(Value::as_str)
                    .map(String::from),
                origin.fragment.get("default").cloned().unwrap_or(Value::Null),
                ValueType::from_schema(origin.fragment.get("type")),
            ),
            OptionKind::Plain | OptionKind::Flag => (None, Value::Null, ValueType::String),
        };

        Self {
            token: format!("--{name}"),
            kind,
            name: Some(name.to_string()),
            description,
            default_value: default.clone(),
            value: default,
            value_type,
            one_of: None,
            required: false,
            processed: false,
        }
    }

    /// Replaces the schema path recorded for a schema-derived option.
    pub(crate) fn at_path(mut self, path: Vec<String>) -> Self {
        if let OptionKind::SchemaProperty(origin) | OptionKind::MetadataSchemaProperty(origin) =
            &mut self.kind
        {
            origin.path = path;
        }
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the default, which also becomes the current value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.value = default.clone();
        self.default_value = default;
        self
    }

    pub fn with_one_of(mut self, choices: Vec<Value>) -> Self {
        self.one_of = Some(choices);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The on-the-wire token, e.g. `--name`.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, OptionKind::Flag)
    }

    /// Schema origin for schema-derived options.
    pub fn schema_origin(&self) -> Option<&SchemaOrigin> {
        match &self.kind {
            OptionKind::SchemaProperty(origin) | OptionKind::MetadataSchemaProperty(origin) => {
                Some(origin)
            }
            OptionKind::Plain | OptionKind::Flag => None,
        }
    }

    /// Key under which the option is stored in an [`OptionSet`].
    pub fn key(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.token.trim_start_matches('-'))
    }

    /// Coerces `raw` into [`value`](Self::value) according to the declared type.
    ///
    /// Array and object values given as text must be JSON literals
    /// (`["a", "b"]`, `{"k": 1}`); single-quoted literals are a coercion
    /// error. Values that are already JSON arrays or objects pass through.
    pub fn set_value(&mut self, raw: &Value) -> Result<()> {
        self.value = self.coerce(raw)?;
        Ok(())
    }

    fn coerce(&self, raw: &Value) -> Result<Value> {
        // A valueless token carries no data of any type.
        if raw.is_null() {
            return Ok(Value::Null);
        }

        match &self.value_type {
            ValueType::Array | ValueType::Object => match raw {
                Value::String(text) => {
                    serde_json::from_str(text).map_err(|_| self.coercion_error(raw))
                }
                other => Ok(other.clone()),
            },
            ValueType::Integer => match raw {
                Value::String(text) => parse_integer(text.trim())
                    .ok_or_else(|| self.coercion_error(raw)),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
                Value::Number(n) => n
                    .as_f64()
                    .map(|f| Value::from(f.trunc() as i64))
                    .ok_or_else(|| self.coercion_error(raw)),
                Value::Bool(b) => Ok(Value::from(i64::from(*b))),
                _ => Err(self.coercion_error(raw)),
            },
            ValueType::Number => match raw {
                Value::String(text) if text.contains('.') => text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.coercion_error(raw)),
                Value::String(text) => parse_integer(text.trim())
                    .ok_or_else(|| self.coercion_error(raw)),
                Value::Number(_) => Ok(raw.clone()),
                _ => Err(self.coercion_error(raw)),
            },
            ValueType::Boolean => {
                if raw.is_boolean() {
                    return Ok(raw.clone());
                }
                match raw_text(raw).to_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    // left for downstream schema validation to reject
                    _ => Ok(raw.clone()),
                }
            }
            ValueType::Null => match raw_text(raw).as_str() {
                "null" | "None" => Ok(Value::Null),
                _ => Ok(raw.clone()),
            },
            ValueType::String | ValueType::Other(_) => Ok(raw.clone()),
        }
    }

    fn coercion_error(&self, raw: &Value) -> OptionError {
        OptionError::Coercion {
            token: self.token.clone(),
            value_type: self.value_type.clone(),
            raw: raw_text(raw),
        }
    }
}

impl SchemaOrigin {
    fn from_fragment(name: &str, fragment: &Value) -> Self {
        Self {
            fragment: fragment.as_object().cloned().unwrap_or_default(),
            path: name.split('.').map(String::from).collect(),
        }
    }
}

/// Parses a whole number into the widest JSON integer that holds it.
fn parse_integer(text: &str) -> Option<Value> {
    text.parse::<i64>()
        .map(Value::from)
        .or_else(|_| text.parse::<u64>().map(Value::from))
        .ok()
}

/// Text form of a raw value: strings unquoted, everything else as JSON.
pub(crate) fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Truthiness of a value: null, `false`, zero and empty containers are falsy.
///
/// # Examples
///
/// ```
/// use schema_options_core::is_truthy;
/// use serde_json::json;
///
/// assert!(is_truthy(&json!("x")));
/// assert!(!is_truthy(&json!("")));
/// assert!(!is_truthy(&json!(0)));
/// assert!(!is_truthy(&json!([])));
/// assert!(!is_truthy(&json!(null)));
/// ```
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Mapping from option key to [`CliOption`], in insertion order.
///
/// Keys are unique: inserting an option whose key is already present
/// replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    options: Vec<CliOption>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an option, returning the one it replaced.
    pub fn insert(&mut self, option: CliOption) -> Option<CliOption> {
        match self.position(option.key()) {
            Some(idx) => Some(std::mem::replace(&mut self.options[idx], option)),
            None => {
                self.options.push(option);
                None
            }
        }
    }

    /// Merges another set into this one.
    pub fn extend(&mut self, other: OptionSet) {
        for option in other.options {
            self.insert(option);
        }
    }

    pub fn get(&self, key: &str) -> Option<&CliOption> {
        self.options.iter().find(|o| o.key() == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CliOption> {
        self.options.iter_mut().find(|o| o.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CliOption> {
        self.options.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CliOption> {
        self.options.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(CliOption::key)
    }

    /// Current values keyed by option key.
    pub fn values(&self) -> Map<String, Value> {
        self.options
            .iter()
            .map(|o| (o.key().to_string(), o.value.clone()))
            .collect()
    }

    /// Reassembles schema-derived values into an instance document.
    ///
    /// Each value is written at its schema path, so nested properties land
    /// back inside `metadata` and their sub-objects. Null values and options
    /// that did not come from a schema are left out.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_options_core::schema_to_options;
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "properties": {
    ///         "display_name": {"type": "string"},
    ///         "metadata": {"type": "object", "properties": {
    ///             "auth": {"type": "object", "properties": {"user": {"type": "string"}}}
    ///         }}
    ///     }
    /// });
    /// let mut options = schema_to_options(&schema).unwrap();
    /// options.get_mut("display_name").unwrap().value = json!("Local");
    /// options.get_mut("auth.user").unwrap().value = json!("admin");
    ///
    /// assert_eq!(
    ///     options.to_instance(),
    ///     json!({"display_name": "Local", "metadata": {"auth": {"user": "admin"}}})
    /// );
    /// ```
    pub fn to_instance(&self) -> Value {
        let mut root = Map::new();
        for option in &self.options {
            let Some(origin) = option.schema_origin() else {
                continue;
            };
            if option.value.is_null() {
                continue;
            }
            insert_at_path(&mut root, &origin.path, option.value.clone());
        }
        Value::Object(root)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.options.iter().position(|o| o.key() == key)
    }
}

pub(crate) fn insert_at_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

impl FromIterator<CliOption> for OptionSet {
    fn from_iter<I: IntoIterator<Item = CliOption>>(iter: I) -> Self {
        let mut set = Self::new();
        for option in iter {
            set.insert(option);
        }
        set
    }
}

impl IntoIterator for OptionSet {
    type Item = CliOption;
    type IntoIter = std::vec::IntoIter<CliOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.into_iter()
    }
}

impl<'a> IntoIterator for &'a OptionSet {
    type Item = &'a CliOption;
    type IntoIter = std::slice::Iter<'a, CliOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

impl<'a> IntoIterator for &'a mut OptionSet {
    type Item = &'a mut CliOption;
    type IntoIter = std::slice::IterMut<'a, CliOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn typed(value_type: ValueType) -> CliOption {
        CliOption::new("--value", value_type)
    }

    #[test]
    fn test_number_coercion_picks_integer_or_float() {
        let mut option = typed(ValueType::Number);
        option.set_value(&json!("3")).unwrap();
        assert_eq!(option.value, json!(3));
        assert!(option.value.is_i64());

        option.set_value(&json!("3.5")).unwrap();
        assert_eq!(option.value, json!(3.5));
    }

    #[test]
    fn test_integer_coercion_range() {
        let mut option = typed(ValueType::Integer);
        option.set_value(&json!("18446744073709551615")).unwrap();
        assert_eq!(option.value, json!(u64::MAX));
        option.set_value(&json!("-9223372036854775808")).unwrap();
        assert_eq!(option.value, json!(i64::MIN));

        let err = option.set_value(&json!("99999999999999999999")).unwrap_err();
        assert!(matches!(err, OptionError::Coercion { .. }));
    }

    #[test]
    fn test_array_coercion_is_json_only() {
        let mut option = typed(ValueType::Array);
        assert!(option.set_value(&json!("['a', 'b']")).is_err());
        option.set_value(&json!("[\"a\", \"b\"]")).unwrap();
        assert_eq!(option.value, json!(["a", "b"]));
    }

    #[test]
    fn test_number_coercion_rejects_garbage() {
        let mut option = typed(ValueType::Number);
        let err = option.set_value(&json!("3.x")).unwrap_err();
        assert!(matches!(err, OptionError::Coercion { .. }));
    }

    #[test]
    fn test_integer_coercion() {
        let mut option = typed(ValueType::Integer);
        option.set_value(&json!("42")).unwrap();
        assert_eq!(option.value, json!(42));
        option.set_value(&json!(7)).unwrap();
        assert_eq!(option.value, json!(7));
        assert!(option.set_value(&json!("4.2")).is_err());
        assert!(option.set_value(&json!("abc")).is_err());
    }

    #[test]
    fn test_boolean_coercion_is_permissive() {
        let mut option = typed(ValueType::Boolean);
        option.set_value(&json!("TRUE")).unwrap();
        assert_eq!(option.value, json!(true));
        option.set_value(&json!("0")).unwrap();
        assert_eq!(option.value, json!(false));
        option.set_value(&json!(true)).unwrap();
        assert_eq!(option.value, json!(true));
        option.set_value(&json!("maybe")).unwrap();
        assert_eq!(option.value, json!("maybe"));
    }

    #[test]
    fn test_null_coercion() {
        let mut option = typed(ValueType::Null);
        option.set_value(&json!("None")).unwrap();
        assert_eq!(option.value, Value::Null);
        option.set_value(&json!("something")).unwrap();
        assert_eq!(option.value, json!("something"));
    }

    #[test]
    fn test_array_and_object_parse_literals() {
        let mut option = typed(ValueType::Array);
        option.set_value(&json!("[1, \"two\"]")).unwrap();
        assert_eq!(option.value, json!([1, "two"]));

        let mut option = typed(ValueType::Object);
        option.set_value(&json!("{\"a\": {\"b\": 1}}")).unwrap();
        assert_eq!(option.value, json!({"a": {"b": 1}}));
        assert!(option.set_value(&json!("{not json")).is_err());

        // values loaded from a JSON file arrive already typed
        option.set_value(&json!({"c": 2})).unwrap();
        assert_eq!(option.value, json!({"c": 2}));
    }

    #[test]
    fn test_string_and_unknown_types_store_raw() {
        let mut option = typed(ValueType::Other("custom".into()));
        option.set_value(&json!("12")).unwrap();
        assert_eq!(option.value, json!("12"));
    }

    #[test]
    fn test_schema_property_seeds_from_fragment() {
        let option = CliOption::schema_property(
            "display_name",
            &json!({"type": "string", "description": "Name shown in UI", "default": "x"}),
        );
        assert_eq!(option.token(), "--display_name");
        assert_eq!(option.description.as_deref(), Some("Name shown in UI"));
        assert_eq!(option.value, json!("x"));
        assert_eq!(option.default_value, json!("x"));
        assert!(!option.required);
    }

    #[test]
    fn test_option_set_replaces_duplicate_keys() {
        let mut set = OptionSet::new();
        set.insert(CliOption::new("--a", ValueType::String));
        let replaced = set.insert(CliOption::new("--a", ValueType::Integer));
        assert!(replaced.is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().value_type, ValueType::Integer);
    }

    #[test]
    fn test_to_instance_skips_plain_options_and_nulls() {
        let mut set: OptionSet = [
            CliOption::new("--schema", ValueType::String).with_default(json!("x")),
            CliOption::schema_property("display_name", &json!({"type": "string"})),
            CliOption::metadata_schema_property("host", &json!({"type": "string"}))
                .at_path(vec!["metadata".into(), "host".into()]),
        ]
        .into_iter()
        .collect();
        set.get_mut("host").unwrap().value = json!("localhost");

        assert_eq!(set.to_instance(), json!({"metadata": {"host": "localhost"}}));

        let values = set.values();
        assert_eq!(values["schema"], json!("x"));
        assert_eq!(values["display_name"], Value::Null);
        assert_eq!(values["host"], json!("localhost"));
    }
}
