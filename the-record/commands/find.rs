//! Find-control commands. None of these are ever captured; a confirmed search
//! reaches the open book as a single find record instead.

use serde_json::Value;
use the_core::Editor;
use the_find::{
  FindError,
  FindSession,
};

use super::string_arg;
use crate::{
  app::App,
  registry::{
    CommandError,
    CommandOptions,
    CommandRegistry,
    CommandResult,
  },
};

pub const FIND: &str = "find";
pub const REVERSE_FIND: &str = "reverse_find";
pub const CONFIRM: &str = "find.confirm";
pub const CANCEL: &str = "find.cancel";
pub const NEXT_CONTEXT: &str = "find.next_context";
pub const PREVIOUS_CONTEXT: &str = "find.previous_context";
pub const TOGGLE_REGEX: &str = "find.toggle_regex";
pub const TOGGLE_CASE_SENSITIVE: &str = "find.toggle_case_sensitive";
pub const TOGGLE_WHOLE_WORD: &str = "find.toggle_whole_word";
pub const TOGGLE_REPLACE_MODE: &str = "find.toggle_replace_mode";
pub const REPLACE_ONE: &str = "find.replace_one";
pub const REPLACE_ALL: &str = "find.replace_all";
pub const ACCEPT_SUGGESTION: &str = "find.accept_suggestion";

pub(crate) fn register(registry: &mut CommandRegistry) {
  let plain = CommandOptions::default();
  registry.register(FIND, "Start find, or go to the next match", plain, cmd_find);
  registry.register(REVERSE_FIND, "Start reverse find, or go to the previous match", plain, cmd_reverse_find);
  registry.register(CONFIRM, "Leave find with the current match selected", plain, cmd_confirm);
  registry.register(CANCEL, "Leave find without recording it", plain, cmd_cancel);
  registry.register(NEXT_CONTEXT, "Recall a newer find query", plain, |app, _| {
    with_session(app, FindSession::next_context)
  });
  registry.register(PREVIOUS_CONTEXT, "Recall an older find query", plain, |app, _| {
    with_session(app, FindSession::prev_context)
  });
  registry.register(TOGGLE_REGEX, "Toggle regex matching", plain, |app, _| {
    with_session(app, FindSession::toggle_regex)
  });
  registry.register(TOGGLE_CASE_SENSITIVE, "Toggle case sensitive matching", plain, |app, _| {
    with_session(app, FindSession::toggle_case_sensitive)
  });
  registry.register(TOGGLE_WHOLE_WORD, "Toggle whole word matching", plain, |app, _| {
    with_session(app, FindSession::toggle_whole_word)
  });
  registry.register(TOGGLE_REPLACE_MODE, "Toggle editing the replacement text", plain, |app, _| {
    with_session(app, FindSession::toggle_replace_mode)
  });
  registry.register(REPLACE_ONE, "Replace the current match", plain, |app, _| {
    with_session(app, |find, editor| find.replace(editor, false))
  });
  registry.register(REPLACE_ALL, "Replace every match", plain, |app, _| {
    with_session(app, |find, editor| find.replace(editor, true))
  });
  registry.register(ACCEPT_SUGGESTION, "Search for a suggested word", plain, cmd_accept_suggestion);
}

fn with_session<F>(app: &mut App, f: F) -> CommandResult
where
  F: FnOnce(&mut FindSession, &mut dyn Editor) -> Result<(), FindError>,
{
  let (find, editor) = app.find_parts().ok_or(FindError::NoEditor)?;
  Ok(f(find, editor)?)
}

fn start_or_step(app: &mut App, args: &[Value], reverse: bool) -> CommandResult {
  let initial = args.first().and_then(Value::as_str);
  with_session(app, |find, editor| {
    match (find.is_active(), reverse) {
      (true, false) => find.next_match(editor),
      (true, true) => find.prev_match(editor),
      (false, _) => find.start(editor, reverse, initial),
    }
  })
}

fn cmd_find(app: &mut App, args: &[Value]) -> CommandResult {
  start_or_step(app, args, false)
}

fn cmd_reverse_find(app: &mut App, args: &[Value]) -> CommandResult {
  start_or_step(app, args, true)
}

fn cmd_confirm(app: &mut App, _args: &[Value]) -> CommandResult {
  app.end_find(true);
  Ok(())
}

fn cmd_cancel(app: &mut App, _args: &[Value]) -> CommandResult {
  app.end_find(false);
  Ok(())
}

fn cmd_accept_suggestion(app: &mut App, args: &[Value]) -> CommandResult {
  let query = string_arg(ACCEPT_SUGGESTION, args)?;
  if !app.find().is_active() {
    return Err(CommandError::from(FindError::Inactive));
  }
  with_session(app, |find, editor| find.set_query(editor, query))
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use the_core::MemoryEditor;

  use super::*;
  use crate::{
    commands::edit::{
      DELETE_LEFT,
      TYPE,
    },
    config::Config,
    host::NoPrompt,
  };

  fn app(text: &str) -> (App, MemoryEditor) {
    let editor = MemoryEditor::new(text);
    let app = App::new(Config::default(), NoPrompt).with_editor(editor.clone());
    (app, editor)
  }

  fn selected(editor: &MemoryEditor) -> String {
    let range = editor.selection().range();
    let line = editor.lines()[range.start.line].clone();
    line
      .chars()
      .skip(range.start.col)
      .take(range.end.col - range.start.col)
      .collect()
  }

  #[test]
  fn typing_routes_to_the_query() {
    let (mut app, editor) = app("cat car cab");
    app.run(FIND, &[]).unwrap();
    app.run(TYPE, &[json!("cab")]).unwrap();
    assert_eq!(app.find().match_count(), 1);
    app.run(DELETE_LEFT, &[]).unwrap();
    assert_eq!(app.find().match_count(), 3);
    assert_eq!(editor.contents(), "cat car cab");

    app.run(FIND, &[]).unwrap();
    app.run(CONFIRM, &[]).unwrap();
    assert!(!app.find().is_active());
    assert_eq!(selected(&editor), "car");
  }

  #[test]
  fn reverse_find_lands_before_the_cursor() {
    let (mut app, editor) = app("x1 x2 x3");
    editor.clone().set_selection(the_core::Selection::point((0, 5).into()));
    app.run(REVERSE_FIND, &[json!("x")]).unwrap();
    assert_eq!(selected(&editor), "x2");
    app.run(REVERSE_FIND, &[]).unwrap();
    assert_eq!(selected(&editor), "x1");
    app.run(CANCEL, &[]).unwrap();
    assert!(!app.find().is_active());
  }

  #[test]
  fn replace_all_in_replace_mode() {
    let (mut app, editor) = app("a-b a-b");
    app.run(FIND, &[json!("a-b")]).unwrap();
    app.run(TOGGLE_REPLACE_MODE, &[]).unwrap();
    app.run(TYPE, &[json!("ok")]).unwrap();
    app.run(REPLACE_ALL, &[]).unwrap();
    assert_eq!(editor.contents(), "ok ok");
    assert_eq!(app.find().match_count(), 0);
  }

  #[test]
  fn accepting_a_suggestion_replaces_the_query() {
    let (mut app, editor) = app("foo foobar foobaz");
    app.run(TOGGLE_WHOLE_WORD, &[]).unwrap();
    app.run(FIND, &[json!("foob")]).unwrap();
    assert_eq!(app.find().match_count(), 0);
    app.run(ACCEPT_SUGGESTION, &[json!("foobaz")]).unwrap();
    assert_eq!(selected(&editor), "foobaz");
    app.run(TOGGLE_WHOLE_WORD, &[]).unwrap();
    app.run(CONFIRM, &[]).unwrap();
  }

  #[test]
  fn inactive_controls_are_rejected() {
    let (mut app, _editor) = app("text");
    let err = app.run(REPLACE_ONE, &[]).unwrap_err();
    assert_eq!(err.message, "find mode is not active");
    assert!(app.run(ACCEPT_SUGGESTION, &[json!("x")]).is_err());

    let mut bare = App::new(Config::default(), NoPrompt);
    let err = bare.run(FIND, &[]).unwrap_err();
    assert_eq!(err.message, "Editor must have focus for find");
  }

  #[test]
  fn history_boundaries_are_informational() {
    let (mut app, _editor) = app("text");
    app.run(FIND, &[json!("te")]).unwrap();
    let err = app.run(NEXT_CONTEXT, &[]).unwrap_err();
    assert_eq!(err.level, crate::messages::MessageLevel::Info);
    assert_eq!(err.message, "End of find cache");
  }
}
