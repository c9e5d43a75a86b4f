use std::{
  collections::HashMap,
  fmt,
  sync::Arc,
};

use serde_json::Value;
use the_find::FindError;

use crate::{
  app::App,
  messages::MessageLevel,
};

pub type CommandFn = Arc<dyn Fn(&mut App, &[Value]) -> CommandResult + Send + Sync>;

pub type CommandResult = Result<(), CommandError>;

/// A rejected command. The message is what the user gets told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
  pub message: String,
  pub level:   MessageLevel,
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl std::error::Error for CommandError {}

impl CommandError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      level:   MessageLevel::Error,
    }
  }

  /// Rejection worth mentioning that is not a failure, e.g. "Not recording!".
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      level:   MessageLevel::Info,
    }
  }

  pub fn no_editor() -> Self {
    Self::new("No active editor")
  }
}

impl From<FindError> for CommandError {
  fn from(err: FindError) -> Self {
    if err.is_info() {
      Self::info(err.to_string())
    } else {
      Self::new(err.to_string())
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
  /// Exempt from the queue's slow-command warning.
  pub no_timeout: bool,
}

#[derive(Clone)]
pub struct Command {
  pub name:    String,
  pub doc:     &'static str,
  pub options: CommandOptions,
  pub fun:     CommandFn,
}

impl fmt::Debug for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Command")
      .field("name", &self.name)
      .field("doc", &self.doc)
      .field("options", &self.options)
      .finish()
  }
}

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
  commands: HashMap<String, Arc<Command>>,
}

impl CommandRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `fun` under `name`, replacing any previous command.
  pub fn register<F>(&mut self, name: impl Into<String>, doc: &'static str, options: CommandOptions, fun: F)
  where
    F: Fn(&mut App, &[Value]) -> CommandResult + Send + Sync + 'static,
  {
    let name = name.into();
    let command = Command {
      name: name.clone(),
      doc,
      options,
      fun: Arc::new(fun),
    };
    self.commands.insert(name, Arc::new(command));
  }

  pub fn get(&self, name: &str) -> Option<&Arc<Command>> {
    self.commands.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.commands.contains_key(name)
  }

  pub fn options(&self, name: &str) -> CommandOptions {
    self
      .commands
      .get(name)
      .map(|command| command.options)
      .unwrap_or_default()
  }

  pub fn command_names(&self) -> Vec<&str> {
    let mut names: Vec<_> = self.commands.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}
