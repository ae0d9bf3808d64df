//! Error types for option compilation and argument resolution.
//!
//! Every user-facing failure is terminal: the process boundary prints the
//! message (and help text where [`OptionError::shows_help`] holds) and exits
//! with [`OptionError::exit_code`].

use serde_json::Value;
use thiserror::Error;

use crate::types::ValueType;

/// Errors raised while compiling schemas or resolving arguments.
#[derive(Debug, Error)]
pub enum OptionError {
    /// A raw value could not be converted to the option's declared type.
    #[error("Parameter '{token}' expects a value of type {value_type}, got '{raw}'.")]
    Coercion {
        token: String,
        value_type: ValueType,
        raw: String,
    },

    /// A required option is absent from the arguments.
    #[error("{}", missing_required_message(.token, .one_of.as_deref()))]
    MissingRequired {
        token: String,
        one_of: Option<Vec<Value>>,
    },

    /// A required option was given without a usable value.
    #[error("Parameter '{token}' requires a value.")]
    MissingValue { token: String },

    /// A value is not a member of the option's allowed set.
    #[error("Parameter '{token}' requires one of the following values: {}", render_choices(.one_of))]
    InvalidChoice { token: String, one_of: Vec<Value> },

    /// Arguments remained after every option was resolved.
    #[error("The following arguments were unexpected: [{}]", .0.join(", "))]
    UnknownOption(Vec<String>),

    /// A `--file` payload, log level or other input could not be read.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The head of the argument vector is not a registered subcommand.
    #[error("Subcommand '{0}' is invalid.")]
    InvalidSubcommand(String),

    /// The argument vector was empty where a subcommand was expected.
    #[error("No subcommand specified. Must specify one of: [{}]", .0.join(", "))]
    NoSubcommand(Vec<String>),

    /// A help token was present.
    #[error("help requested")]
    HelpRequested,

    /// A schema fragment has an unexpected shape.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A schema lists a required property the compiler never emitted.
    #[error("required property '{0}' is not declared in the schema properties")]
    UndeclaredRequired(String),

    /// The resolver tried to remove a token that is not in the mapping.
    #[error("Can't find option '{0}' in argv!")]
    MissingArgument(String),

    /// File I/O failure while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OptionError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::HelpRequested => 0,
            _ => 1,
        }
    }

    /// Whether help text should follow the message.
    pub fn shows_help(&self) -> bool {
        matches!(
            self,
            Self::HelpRequested
                | Self::NoSubcommand(_)
                | Self::InvalidSubcommand(_)
                | Self::MissingRequired { .. }
                | Self::MissingValue { .. }
                | Self::InvalidChoice { .. }
                | Self::UnknownOption(_)
        )
    }
}

fn missing_required_message(token: &str, one_of: Option<&[Value]>) -> String {
    match one_of {
        None => format!("'{token}' is a required parameter."),
        Some(choices) => format!(
            "'{token}' is a required parameter and must be one of the following values: {}.",
            render_choices(choices)
        ),
    }
}

fn render_choices(choices: &[Value]) -> String {
    let rendered: Vec<String> = choices.iter().map(Value::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Convenience alias for results with [`OptionError`].
pub type Result<T> = std::result::Result<T, OptionError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_required_message_with_choices() {
        let err = OptionError::MissingRequired {
            token: "--color".into(),
            one_of: Some(vec![json!("red"), json!("blue")]),
        };
        assert_eq!(
            err.to_string(),
            "'--color' is a required parameter and must be one of the following values: [\"red\", \"blue\"]."
        );
        assert!(err.shows_help());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_help_requested_exits_cleanly() {
        assert_eq!(OptionError::HelpRequested.exit_code(), 0);
        assert!(OptionError::HelpRequested.shows_help());
        assert!(OptionError::InvalidSubcommand("x".into()).shows_help());
        assert!(!OptionError::InvalidInput("x".into()).shows_help());
    }

    #[test]
    fn test_unknown_option_lists_arguments() {
        let err = OptionError::UnknownOption(vec!["--a=1".into(), "--b".into()]);
        assert_eq!(
            err.to_string(),
            "The following arguments were unexpected: [--a=1, --b]"
        );
    }
}
