//! Help rendering for options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CliOption, raw_text};

/// Schema keywords never shown in the auxiliary metadata clause.
///
/// Description and type are already on the help line; the rest do not
/// render succinctly.
pub const SKIPPED_META_PROPERTIES: [&str; 11] = [
    "description",
    "type",
    "items",
    "additionalItems",
    "properties",
    "propertyNames",
    "dependencies",
    "examples",
    "contains",
    "additionalProperties",
    "patternProperties",
];

/// Help display settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Append remaining schema keywords (`default`, `enum`, ...) to descriptions.
    pub show_meta_properties: bool,
}

impl HelpConfig {
    /// Renders one option: its usage line, then the indented description.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_options_core::{CliOption, HelpConfig, ValueType};
    ///
    /// let help = HelpConfig::default();
    /// let port = CliOption::new("--port", ValueType::Integer).with_description("Port");
    /// assert_eq!(help.render_option(&port), "--port=<integer>\n\tPort\n");
    ///
    /// let replace = CliOption::flag("--replace").with_description("Overwrite");
    /// assert_eq!(help.render_option(&replace), "--replace\n\tOverwrite\n");
    /// ```
    pub fn render_option(&self, option: &CliOption) -> String {
        let usage = if option.is_flag() {
            option.token().to_string()
        } else {
            format!("{}=<{}>", option.token(), option.value_type)
        };

        let clause = match option.schema_origin() {
            Some(origin) if self.show_meta_properties => meta_clause(&origin.fragment),
            _ => String::new(),
        };

        format!(
            "{usage}\n\t{}{clause}\n",
            option.description.as_deref().unwrap_or("")
        )
    }

    /// Renders a sequence of options in order.
    pub fn render_options<'a, I>(&self, options: I) -> String
    where
        I: IntoIterator<Item = &'a CliOption>,
    {
        options
            .into_iter()
            .map(|option| self.render_option(option))
            .collect()
    }
}

fn meta_clause(fragment: &Map<String, Value>) -> String {
    let mut clause = String::new();
    for (keyword, value) in fragment {
        if SKIPPED_META_PROPERTIES.contains(&keyword.as_str()) {
            continue;
        }
        clause.push_str(if clause.is_empty() { "; " } else { ", " });
        clause.push_str(&format!("{keyword}: {}", raw_text(value)));
    }
    clause
}
