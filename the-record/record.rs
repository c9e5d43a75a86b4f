//! Recorded actions.
//!
//! A [`Record`] is one captured user action. Three kinds exist:
//!
//! - [`TypeRecord`]: literal typed text.
//! - [`CommandRecord`]: any other registered command, replayed by invoking it
//!   again with the same arguments.
//! - [`FindRecord`]: a confirmed find, replayed by searching again from the
//!   current cursor. Its playback reports the live match count, which is what
//!   repeat playback steers by.
//!
//! While a book is open, adjacent records may merge ("eat") to keep the log
//! compact. Which pairs merge depends only on the two kinds involved.

use std::fmt;

use serde_json::Value;
use the_core::{
  Edit,
  EditError,
  LineIndex,
  Range,
  Selection,
};
use the_find::{
  Document,
  FindCapture,
  FindError,
  MatchError,
  MatchTracker,
  RefreshProps,
};
use thiserror::Error;

use crate::{
  app::App,
  commands::edit::{
    CURSOR_END,
    DELETE_LEFT,
    TYPE,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
  Type,
  Command,
  Find,
}

impl fmt::Display for RecordKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      RecordKind::Type => "type",
      RecordKind::Command => "command",
      RecordKind::Find => "find",
    })
  }
}

/// Why a find replay could not select a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindMiss {
  #[error("Failed to playback find recording: {0}")]
  Pattern(MatchError),
  #[error("No match found during recording playback")]
  NoMatch,
  #[error("There are {count} matches, but the FindRecord requires at least {needed}")]
  TooFew { count: usize, needed: usize },
}

impl FindMiss {
  /// Live match count at the time of the miss.
  pub fn count(&self) -> usize {
    match self {
      FindMiss::Pattern(_) | FindMiss::NoMatch => 0,
      FindMiss::TooFew { count, .. } => *count,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
  #[error("No active editor")]
  NoEditor,
  #[error(transparent)]
  Find(#[from] FindMiss),
  #[error(transparent)]
  Search(#[from] FindError),
  #[error("{message}")]
  Command { id: String, message: String },
  #[error("Failed to undo typing: {0}")]
  Edit(#[from] EditError),
  #[error("Cannot undo {0} records")]
  UndoUnsupported(RecordKind),
  #[error("Cannot undo an ended recording")]
  UndoLocked,
  #[error("Nothing to undo")]
  NothingToUndo,
  #[error("Recording has already ended")]
  Locked,
}

pub type Result<T> = std::result::Result<T, RecordError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
  pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
  pub id:   String,
  pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRecord {
  /// Net next/previous steps taken before confirming.
  pub nexts:            isize,
  pub props:            RefreshProps,
  pub last_match_count: Option<usize>,
  pub last_match_index: Option<usize>,
}

/// Match a find replay landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindHit {
  pub count: usize,
  pub index: usize,
}

impl FindRecord {
  pub fn new(capture: FindCapture) -> Self {
    Self {
      nexts:            capture.nexts,
      props:            capture.props,
      last_match_count: None,
      last_match_index: None,
    }
  }

  /// Searches again from the start of the current selection and selects the
  /// match the original session ended on.
  pub fn playback(&mut self, app: &mut App) -> Result<FindHit> {
    let separators = app.find().separators().clone();
    let editor = app.editor_mut().ok_or(RecordError::NoEditor)?;
    let mut tracker = MatchTracker::new(editor);
    match tracker.refresh(editor, &self.props, &separators) {
      Ok(()) => {},
      Err(FindError::Match(err)) => return Err(FindMiss::Pattern(err).into()),
      Err(err) => return Err(err.into()),
    }
    tracker.step(self.nexts);

    let count = tracker.match_count();
    let Some(current) = tracker.current() else {
      return Err(FindMiss::NoMatch.into());
    };
    let steps = self.nexts.unsigned_abs();
    if steps >= count {
      return Err(
        FindMiss::TooFew {
          count,
          needed: steps + 1,
        }
        .into(),
      );
    }

    let hit = FindHit {
      count,
      index: current.index,
    };
    editor.set_selection(Selection::new(current.range.start, current.range.end));
    self.last_match_count = Some(hit.count);
    self.last_match_index = Some(hit.index);
    Ok(hit)
  }

  /// Live number of matches for this record's query, without moving anything.
  pub fn count_matches(&self, app: &App) -> Result<usize> {
    let editor = app.editor().ok_or(RecordError::NoEditor)?;
    let set = Document::new(editor.text())
      .matches(&self.props.query, app.find().separators())
      .map_err(FindMiss::Pattern)?;
    Ok(set.matches.len())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
  Type(TypeRecord),
  Command(CommandRecord),
  Find(FindRecord),
}

impl Record {
  /// Record for a captured command invocation. `type` with a text argument
  /// becomes a [`TypeRecord`].
  pub fn from_command(id: &str, args: &[Value]) -> Self {
    if id == TYPE {
      if let Some(text) = args.first().and_then(Value::as_str) {
        return Record::Type(TypeRecord {
          text: text.to_string(),
        });
      }
    }
    Record::Command(CommandRecord {
      id:   id.to_string(),
      args: args.to_vec(),
    })
  }

  pub fn kind(&self) -> RecordKind {
    match self {
      Record::Type(_) => RecordKind::Type,
      Record::Command(_) => RecordKind::Command,
      Record::Find(_) => RecordKind::Find,
    }
  }

  /// Tries to absorb `next`, the record that chronologically follows this one.
  pub fn eat(&mut self, next: &Record) -> bool {
    match (self, next) {
      (Record::Type(this), Record::Type(next)) => {
        this.text.push_str(&next.text);
        true
      },
      (Record::Type(this), Record::Command(next)) if next.id == DELETE_LEFT && next.args.is_empty() => {
        this.text.pop().is_some()
      },
      (Record::Command(this), Record::Command(next)) => {
        this.id == CURSOR_END && next.id == CURSOR_END && this.args == next.args
      },
      _ => false,
    }
  }

  /// True once merging has left nothing to replay.
  pub fn noop(&self) -> bool {
    match self {
      Record::Type(record) => record.text.is_empty(),
      Record::Command(_) | Record::Find(_) => false,
    }
  }

  pub fn playback(&mut self, app: &mut App) -> Result<()> {
    match self {
      Record::Type(record) => {
        app
          .run(TYPE, &[Value::String(record.text.clone())])
          .map_err(|err| {
            RecordError::Command {
              id:      TYPE.to_string(),
              message: err.message,
            }
          })
      },
      Record::Command(record) => {
        app.run(&record.id, &record.args).map_err(|err| {
          RecordError::Command {
            id:      record.id.clone(),
            message: err.message,
          }
        })
      },
      Record::Find(record) => record.playback(app).map(|_| ()),
    }
  }

  /// Reverts this record's effect on the document. Only typed text can be
  /// reverted. The record's whole text is removed in one edit ending at the
  /// cursor, not a single char: a keystroke record holds one char, but a
  /// `type` call with a longer argument is undone as a unit.
  pub fn undo(&self, app: &mut App) -> Result<()> {
    let record = match self {
      Record::Type(record) => record,
      other => return Err(RecordError::UndoUnsupported(other.kind())),
    };
    let count = record.text.chars().count();
    if count == 0 {
      return Ok(());
    }

    let editor = app.editor_mut().ok_or(RecordError::NoEditor)?;
    let text = editor.text();
    let index = LineIndex::new(&text);
    let cursor = editor.selection().active;
    let end = index
      .offset(&text, cursor)
      .ok_or(EditError::OutOfBounds(cursor))?;
    let start = text[..end]
      .char_indices()
      .rev()
      .nth(count - 1)
      .map_or(0, |(idx, _)| idx);
    let start = index.position(&text, start);

    editor.apply(&[Edit::Delete(Range::new(start, cursor))])?;
    editor.set_selection(Selection::point(start));
    Ok(())
  }
}
