//! Typing, deleting and cursor movement.
//!
//! While find mode is active `type` and `delete_left` edit the query instead
//! of the document. Cursor movement never reaches this module with find
//! active: the gate confirms the search first.

use serde_json::Value;
use the_core::{
  Edit,
  Editor,
  LineIndex,
  Position,
  Range,
  Selection,
};

use super::{
  count_arg,
  string_arg,
};
use crate::{
  app::App,
  registry::{
    CommandError,
    CommandOptions,
    CommandRegistry,
    CommandResult,
  },
};

pub const TYPE: &str = "type";
pub const DELETE_LEFT: &str = "delete_left";
pub const DELETE_RIGHT: &str = "delete_right";
pub const CURSOR_LEFT: &str = "cursor_left";
pub const CURSOR_RIGHT: &str = "cursor_right";
pub const CURSOR_UP: &str = "cursor_up";
pub const CURSOR_DOWN: &str = "cursor_down";
pub const CURSOR_HOME: &str = "cursor_home";
pub const CURSOR_END: &str = "cursor_end";
pub const CURSOR_TOP: &str = "cursor_top";
pub const CURSOR_BOTTOM: &str = "cursor_bottom";

/// Commands that confirm an active find before they run.
pub const CURSOR_MOVES: &[&str] = &[
  CURSOR_LEFT,
  CURSOR_RIGHT,
  CURSOR_UP,
  CURSOR_DOWN,
  CURSOR_HOME,
  CURSOR_END,
  CURSOR_TOP,
  CURSOR_BOTTOM,
];

pub(crate) fn register(registry: &mut CommandRegistry) {
  let plain = CommandOptions::default();
  registry.register(TYPE, "Insert text over the selection", plain, cmd_type);
  registry.register(DELETE_LEFT, "Delete the selection or the char before the cursor", plain, cmd_delete_left);
  registry.register(DELETE_RIGHT, "Delete the selection or the char after the cursor", plain, cmd_delete_right);
  registry.register(CURSOR_LEFT, "Move the cursor one char left", plain, cmd_cursor_left);
  registry.register(CURSOR_RIGHT, "Move the cursor one char right", plain, cmd_cursor_right);
  registry.register(CURSOR_UP, "Move the cursor one line up", plain, cmd_cursor_up);
  registry.register(CURSOR_DOWN, "Move the cursor one line down", plain, cmd_cursor_down);
  registry.register(CURSOR_HOME, "Move to the first non-blank char, then to column 0", plain, cmd_cursor_home);
  registry.register(CURSOR_END, "Move to the end of the line", plain, cmd_cursor_end);
  registry.register(CURSOR_TOP, "Move to the start of the document", plain, cmd_cursor_top);
  registry.register(CURSOR_BOTTOM, "Move to the end of the document", plain, cmd_cursor_bottom);
}

fn editor(app: &mut App) -> Result<&mut dyn Editor, CommandError> {
  app.editor_mut().ok_or_else(CommandError::no_editor)
}

fn cmd_type(app: &mut App, args: &[Value]) -> CommandResult {
  let text = string_arg(TYPE, args)?;
  if app.find().is_active() {
    let (find, editor) = app.find_parts().ok_or_else(CommandError::no_editor)?;
    return Ok(find.insert_text(editor, text)?);
  }

  let editor = editor(app)?;
  let range = editor.selection().range();
  editor
    .apply(&[Edit::Replace {
      range,
      text: text.to_string(),
    }])
    .map_err(|err| CommandError::new(err.to_string()))?;
  editor.set_selection(Selection::point(range.start.traverse(text)));
  Ok(())
}

fn cmd_delete_left(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(DELETE_LEFT, args)?;
  if app.find().is_active() {
    let (find, editor) = app.find_parts().ok_or_else(CommandError::no_editor)?;
    let longest = find.context().map_or(0, |ctx| {
      ctx.query.chars().count().max(ctx.replacement.chars().count())
    });
    for _ in 0..count.min(longest.max(1)) {
      find.delete_char(editor)?;
    }
    return Ok(());
  }
  delete(editor(app)?, -(count as isize))
}

fn cmd_delete_right(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(DELETE_RIGHT, args)?;
  if app.find().is_active() {
    return Err(CommandError::info("Cannot delete forward while finding"));
  }
  delete(editor(app)?, count as isize)
}

/// Deletes the selection, or `chars` chars from the cursor when nothing is
/// selected. Negative counts delete backwards.
fn delete(editor: &mut dyn Editor, chars: isize) -> CommandResult {
  let selection = editor.selection();
  let range = if selection.is_empty() {
    let text = editor.text();
    let index = LineIndex::new(&text);
    let other = shift(&text, &index, selection.active, chars);
    Range::new(selection.active, other)
  } else {
    selection.range()
  };
  if range.is_empty() {
    return Ok(());
  }
  editor
    .apply(&[Edit::Delete(range)])
    .map_err(|err| CommandError::new(err.to_string()))?;
  editor.set_selection(Selection::point(range.start));
  Ok(())
}

/// `pos` moved by `chars` chars, crossing line breaks and stopping at either
/// end of the document.
fn shift(text: &str, index: &LineIndex, pos: Position, chars: isize) -> Position {
  let Some(offset) = index.offset(text, pos) else {
    return pos;
  };
  let steps = chars.unsigned_abs();
  if steps == 0 {
    return pos;
  }
  let target = if chars < 0 {
    text[..offset]
      .char_indices()
      .rev()
      .nth(steps.saturating_sub(1))
      .map_or(0, |(idx, _)| idx)
  } else {
    text[offset..]
      .char_indices()
      .nth(steps)
      .map_or(text.len(), |(idx, _)| offset + idx)
  };
  index.position(text, target)
}

fn move_to(editor: &mut dyn Editor, pos: Position) -> CommandResult {
  editor.set_selection(Selection::point(pos));
  Ok(())
}

fn cmd_cursor_left(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(CURSOR_LEFT, args)?;
  let editor = editor(app)?;
  let selection = editor.selection();
  if !selection.is_empty() {
    return move_to(editor, selection.start());
  }
  let text = editor.text();
  let pos = shift(&text, &LineIndex::new(&text), selection.active, -(count as isize));
  move_to(editor, pos)
}

fn cmd_cursor_right(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(CURSOR_RIGHT, args)?;
  let editor = editor(app)?;
  let selection = editor.selection();
  if !selection.is_empty() {
    return move_to(editor, selection.end());
  }
  let text = editor.text();
  let pos = shift(&text, &LineIndex::new(&text), selection.active, count as isize);
  move_to(editor, pos)
}

fn vertical(editor: &mut dyn Editor, lines: isize) -> CommandResult {
  let active = editor.selection().active;
  let last = editor.line_count().saturating_sub(1);
  let line = active.line.saturating_add_signed(lines).min(last);
  let col = active.col.min(editor.line_len(line).unwrap_or(0));
  move_to(editor, Position::new(line, col))
}

fn cmd_cursor_up(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(CURSOR_UP, args)?;
  vertical(editor(app)?, -(count as isize))
}

fn cmd_cursor_down(app: &mut App, args: &[Value]) -> CommandResult {
  let count = count_arg(CURSOR_DOWN, args)?;
  vertical(editor(app)?, count as isize)
}

fn cmd_cursor_home(app: &mut App, _args: &[Value]) -> CommandResult {
  let editor = editor(app)?;
  let active = editor.selection().active;
  let first = editor.first_non_whitespace(active.line).unwrap_or(0);
  let col = if active.col == first { 0 } else { first };
  move_to(editor, Position::new(active.line, col))
}

fn cmd_cursor_end(app: &mut App, _args: &[Value]) -> CommandResult {
  let editor = editor(app)?;
  let line = editor.selection().active.line;
  let col = editor.line_len(line).unwrap_or(0);
  move_to(editor, Position::new(line, col))
}

fn cmd_cursor_top(app: &mut App, _args: &[Value]) -> CommandResult {
  move_to(editor(app)?, Position::zero())
}

fn cmd_cursor_bottom(app: &mut App, _args: &[Value]) -> CommandResult {
  let editor = editor(app)?;
  let line = editor.line_count().saturating_sub(1);
  let col = editor.line_len(line).unwrap_or(0);
  move_to(editor, Position::new(line, col))
}
