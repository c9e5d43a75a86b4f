//! Built-in commands.

pub mod edit;
pub mod find;
pub mod record;

use serde_json::Value;

use crate::registry::{
  CommandError,
  CommandRegistry,
};

pub fn register_builtins(registry: &mut CommandRegistry) {
  edit::register(registry);
  find::register(registry);
  record::register(registry);
}

/// First positional argument as a string.
pub(crate) fn string_arg<'a>(id: &str, args: &'a [Value]) -> Result<&'a str, CommandError> {
  args
    .first()
    .and_then(Value::as_str)
    .ok_or_else(|| CommandError::new(format!("\"{id}\" expects a text argument")))
}

/// Optional first positional argument as a count, defaulting to 1. Counts
/// never exceed `isize::MAX`, so they can be negated for backward motion.
pub(crate) fn count_arg(id: &str, args: &[Value]) -> Result<usize, CommandError> {
  match args.first() {
    None | Some(Value::Null) => Ok(1),
    Some(value) => {
      value
        .as_u64()
        .and_then(|count| isize::try_from(count).ok())
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| CommandError::new(format!("\"{id}\" expects a count argument")))
    },
  }
}
