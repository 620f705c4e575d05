//! Command: a named bot command whose invocations are counted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, ValidationError};
use crate::id::CommandId;

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());
static INVOCATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\w+)").unwrap());

/// A known command. The name is unique across all commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub name: String,
}

impl Command {
    /// Construct a command and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Validation`] when `name` is empty or contains
    /// anything other than word characters.
    pub fn new(id: CommandId, name: impl Into<String>) -> Result<Self, TallyError> {
        let command = Self {
            id,
            name: name.into(),
        };
        command.validate()?;
        Ok(command)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Validation`] when `name` is empty or not a
    /// single word.
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !NAME.is_match(&self.name) {
            return Err(ValidationError::InvalidCommandName(self.name.clone()).into());
        }
        Ok(())
    }
}

/// Extract the command token from a chat message.
///
/// A message counts as an invocation only when it carries exactly one
/// `/word` token; `"/say hi"` yields `say`, `"/help@tally_bot"` yields
/// `help`, while `"hello"` and `"/say /help"` yield nothing.
#[must_use]
pub fn parse_invocation(text: &str) -> Option<&str> {
    let mut tokens = INVOCATION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1));
    let first = tokens.next()?;
    match tokens.next() {
        Some(_) => None,
        None => Some(first.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_command_when_name_is_a_word() {
        let command = Command::new(CommandId::new(1), "help").unwrap();
        assert_eq!(command.name, "help");
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Command::new(CommandId::new(1), "");
        assert!(matches!(
            result,
            Err(TallyError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_name_has_spaces() {
        let result = Command::new(CommandId::new(1), "say hi");
        assert!(matches!(
            result,
            Err(TallyError::Validation(ValidationError::InvalidCommandName(_)))
        ));
    }

    #[test]
    fn should_extract_single_command_token() {
        assert_eq!(parse_invocation("/help"), Some("help"));
        assert_eq!(parse_invocation("/say hello there"), Some("say"));
        assert_eq!(parse_invocation("/shot@tally_bot https"), Some("shot"));
    }

    #[test]
    fn should_ignore_text_without_command_token() {
        assert_eq!(parse_invocation("hello"), None);
        assert_eq!(parse_invocation(""), None);
        assert_eq!(parse_invocation("/ alone"), None);
    }

    #[test]
    fn should_ignore_text_with_several_command_tokens() {
        assert_eq!(parse_invocation("/say /help"), None);
    }
}
