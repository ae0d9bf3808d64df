//! Subcommand dispatch and application-level help.
//!
//! Subcommands occupy position 0 of the argument vector. [`App`] maps their
//! names to caller-supplied handlers and renders the subcommand catalogue.

use tracing::debug;

use crate::error::{OptionError, Result};
use crate::ingest::{ArgumentState, HELP_TOKENS};

/// A registered subcommand and the handler the caller associates with it.
#[derive(Debug, Clone)]
pub struct Subcommand<H> {
    pub name: String,
    /// One-line description for the catalogue.
    pub description: String,
    pub handler: H,
}

/// An application made of subcommands.
///
/// # Examples
///
/// ```
/// use schema_options_core::{App, ArgumentState, OptionError};
///
/// let app = App::new("metadata-tool", "Manage metadata instances.")
///     .with_subcommand("list", "List instances.", 1)
///     .with_subcommand("create", "Create an instance.", 2);
///
/// let mut state = ArgumentState::from_args(["create", "--name=x"]).unwrap();
/// let sub = app.get_subcommand(&mut state).unwrap().unwrap();
/// assert_eq!(sub.handler, 2);
/// assert_eq!(state.argv(), ["--name=x"]);
///
/// let mut state = ArgumentState::from_args(["destroy"]).unwrap();
/// let err = app.get_subcommand(&mut state).unwrap_err();
/// assert!(matches!(err, OptionError::InvalidSubcommand(name) if name == "destroy"));
/// ```
#[derive(Debug, Clone)]
pub struct App<H> {
    pub name: String,
    pub description: String,
    subcommands: Vec<Subcommand<H>>,
}

impl<H> App<H> {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            subcommands: Vec::new(),
        }
    }

    /// Registers a subcommand. Catalogue order follows registration order.
    pub fn with_subcommand(mut self, name: &str, description: &str, handler: H) -> Self {
        self.subcommands.push(Subcommand {
            name: name.to_string(),
            description: description.to_string(),
            handler,
        });
        self
    }

    pub fn subcommand_names(&self) -> Vec<String> {
        self.subcommands.iter().map(|s| s.name.clone()).collect()
    }

    /// Takes the subcommand from the head of the argument vector.
    ///
    /// Returns `Ok(None)` when the vector is empty. A matching subcommand is
    /// removed from the arguments; a help token yields
    /// [`OptionError::HelpRequested`] and anything else
    /// [`OptionError::InvalidSubcommand`], leaving the caller to decide.
    pub fn get_subcommand(&self, state: &mut ArgumentState) -> Result<Option<&Subcommand<H>>> {
        let Some(head) = state.head().map(String::from) else {
            return Ok(None);
        };

        if let Some(subcommand) = self.subcommands.iter().find(|s| s.name == head) {
            state.remove_entry(&head)?;
            debug!(subcommand = %head, "selected subcommand");
            return Ok(Some(subcommand));
        }

        if HELP_TOKENS.contains(&head.as_str()) {
            return Err(OptionError::HelpRequested);
        }
        Err(OptionError::InvalidSubcommand(head))
    }

    /// Like [`get_subcommand`](Self::get_subcommand), but an empty vector is
    /// [`OptionError::NoSubcommand`].
    pub fn require_subcommand(&self, state: &mut ArgumentState) -> Result<&Subcommand<H>> {
        self.get_subcommand(state)?
            .ok_or_else(|| OptionError::NoSubcommand(self.subcommand_names()))
    }

    /// Application help: the description followed by the catalogue.
    pub fn render_help(&self) -> String {
        format!("{}\n{}", self.description, self.render_subcommands())
    }

    /// The subcommand catalogue: one name and indented description per entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_options_core::App;
    ///
    /// let app = App::new("tool", "A tool.").with_subcommand("list", "List things.", ());
    /// let catalogue = app.render_subcommands();
    /// assert!(catalogue.contains("Subcommands\n-----------\n"));
    /// assert!(catalogue.ends_with("list\n    List things.\n"));
    /// ```
    pub fn render_subcommands(&self) -> String {
        let mut out = String::new();
        out.push_str("\nSubcommands\n-----------\n");
        out.push_str(&format!(
            "Subcommands are launched as `{name} cmd [args]`. For information on\n\
             using subcommand 'cmd', run: `{name} cmd -h`.\n\n",
            name = self.name
        ));
        for subcommand in &self.subcommands {
            out.push_str(&format!("{}\n    {}\n", subcommand.name, subcommand.description));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App<&'static str> {
        App::new("tool", "Tool description.")
            .with_subcommand("list", "List instances.", "list-handler")
            .with_subcommand("remove", "Remove an instance.", "remove-handler")
    }

    #[test]
    fn test_subcommand_is_removed_from_arguments() {
        let app = app();
        let mut state = ArgumentState::from_args(["remove", "--name=a"]).unwrap();
        let sub = app.get_subcommand(&mut state).unwrap().unwrap();
        assert_eq!(sub.handler, "remove-handler");
        assert_eq!(state.argv(), ["--name=a"]);
        assert!(!state.contains("remove"));
    }

    #[test]
    fn test_help_token_at_head() {
        let app = app();
        for token in HELP_TOKENS {
            let mut state = ArgumentState::from_args([token]).unwrap();
            let err = app.get_subcommand(&mut state).unwrap_err();
            assert!(matches!(err, OptionError::HelpRequested));
        }
    }

    #[test]
    fn test_empty_arguments() {
        let app = app();
        let mut state = ArgumentState::from_args(Vec::<String>::new()).unwrap();
        assert!(app.get_subcommand(&mut state).unwrap().is_none());

        let err = app.require_subcommand(&mut state).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No subcommand specified. Must specify one of: [list, remove]"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_invalid_subcommand_leaves_arguments() {
        let app = app();
        let mut state = ArgumentState::from_args(["--name=a"]).unwrap();
        let err = app.get_subcommand(&mut state).unwrap_err();
        assert_eq!(err.to_string(), "Subcommand '--name=a' is invalid.");
        assert_eq!(state.argv(), ["--name=a"]);
    }

    #[test]
    fn test_render_help_lists_every_subcommand() {
        let help = app().render_help();
        assert!(help.starts_with("Tool description.\n"));
        assert!(help.contains("`tool cmd -h`"));
        assert!(help.contains("list\n    List instances.\n"));
        assert!(help.contains("remove\n    Remove an instance.\n"));
    }
}
