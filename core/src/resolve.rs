//! Option resolution.
//!
//! Consumes an [`OptionSet`] against an [`ArgumentState`]: each option is
//! visited exactly once, its raw value coerced, required/one-of constraints
//! enforced, and its argument removed. Anything left once every option has
//! been visited is an unknown argument.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{OptionError, Result};
use crate::ingest::ArgumentState;
use crate::types::{CliOption, ValueType, is_truthy};

impl ArgumentState {
    /// Resolves a single option against the arguments.
    ///
    /// Re-processing an option that is already marked processed is a no-op.
    /// With `check_help`, a help token anywhere in the arguments short-circuits
    /// with [`OptionError::HelpRequested`] before anything else happens.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_options_core::{ArgumentState, CliOption, ValueType};
    /// use serde_json::json;
    ///
    /// let mut state = ArgumentState::from_args(["--count=3", "--force"]).unwrap();
    /// let mut count = CliOption::new("--count", ValueType::Integer);
    /// let mut force = CliOption::flag("--force");
    ///
    /// state.process_option(&mut count, true).unwrap();
    /// state.process_option(&mut force, true).unwrap();
    ///
    /// assert_eq!(count.value, json!(3));
    /// assert_eq!(force.value, json!(true));
    /// assert!(state.is_empty());
    /// ```
    pub fn process_option(&mut self, option: &mut CliOption, check_help: bool) -> Result<()> {
        if check_help && self.has_help() {
            return Err(OptionError::HelpRequested);
        }
        if option.processed {
            return Ok(());
        }

        let outcome = self.resolve_option(option);
        option.processed = true;
        outcome
    }

    /// Resolves every option, then fails if any argument was left unconsumed.
    pub fn process_options<'a, I>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a mut CliOption>,
    {
        if self.has_help() {
            return Err(OptionError::HelpRequested);
        }

        for option in options {
            self.process_option(option, false)?;
        }

        let leftovers = self.leftovers();
        if !leftovers.is_empty() {
            return Err(OptionError::UnknownOption(leftovers));
        }
        Ok(())
    }

    /// Whether a required option is missing its value.
    ///
    /// Dotted options belong to a sub-object, which is all-or-nothing: if no
    /// sibling field of the sub-object was supplied, the option's requirement
    /// is dropped for good and it is not considered missing.
    pub fn required_value_is_missing(&self, option: &mut CliOption) -> bool {
        if !option.required || !option.value.is_null() {
            return false;
        }

        let token = option.token().to_string();
        let dotted = option.name.as_deref().unwrap_or(&token).contains('.');
        let Some((parent, _)) = token.rsplit_once('.').filter(|_| dotted) else {
            return true;
        };

        let sibling_prefix = format!("{parent}.");
        let siblings_supplied = self.supplied().any(|(other, value)| {
            *other != token && other.starts_with(&sibling_prefix) && !value.is_null()
        });
        if siblings_supplied {
            return true;
        }

        warn!(option = %token, "sub-object not supplied, dropping requirement");
        option.required = false;
        false
    }

    fn resolve_option(&mut self, option: &mut CliOption) -> Result<()> {
        let token = option.token().to_string();

        // free-form objects arrive from --file as dotted entries
        let (raw, nested) = match self.get(&token).cloned() {
            Some(raw) => (raw, false),
            None => match self
                .nested_object(&token)
                .filter(|_| option.value_type == ValueType::Object)
            {
                Some(object) => (object, true),
                None => {
                    if self.required_value_is_missing(option) {
                        return Err(OptionError::MissingRequired {
                            token,
                            one_of: option.one_of.clone(),
                        });
                    }
                    return Ok(());
                }
            },
        };

        if option.is_flag() {
            option.value = Value::Bool(!is_truthy(&option.default_value));
        } else {
            option.set_value(&raw)?;
            if option.required && !is_truthy(&option.value) {
                return Err(OptionError::MissingValue { token });
            }
            if let Some(choices) = &option.one_of {
                if !choices.contains(&option.value) {
                    return Err(OptionError::InvalidChoice {
                        token,
                        one_of: choices.clone(),
                    });
                }
            }
        }

        debug!(option = %token, value = %option.value, "resolved option");
        if nested {
            self.remove_nested(&token)
        } else {
            self.remove_entry(&token)
        }
    }
}
