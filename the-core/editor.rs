//! The surface a host editor exposes to the behavior layer.
//!
//! Everything the find engine and the recorder do to a document goes through
//! [`Editor`]: reading the text, moving the selection, applying an atomic
//! batch of edits and painting decorations.

use std::{
  fmt,
  num::NonZeroUsize,
  sync::atomic::{
    AtomicUsize,
    Ordering,
  },
};

use thiserror::Error;

use crate::position::{
  Position,
  Range,
  Selection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditorId(NonZeroUsize);

static NEXT_EDITOR_ID: AtomicUsize = AtomicUsize::new(1);

impl EditorId {
  pub fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  /// Hands out a process-unique id.
  pub fn next() -> Self {
    let raw = NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed);
    Self(NonZeroUsize::new(raw).unwrap_or(NonZeroUsize::MIN))
  }

  pub fn get(self) -> usize {
    self.0.get()
  }
}

impl fmt::Display for EditorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "editor#{}", self.0)
  }
}

/// One operation of an edit batch. Ranges refer to the text as it was before
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
  Insert { at: Position, text: String },
  Delete(Range),
  Replace { range: Range, text: String },
}

impl Edit {
  pub fn range(&self) -> Range {
    match self {
      Edit::Insert { at, .. } => Range::point(*at),
      Edit::Delete(range) | Edit::Replace { range, .. } => *range,
    }
  }

  pub fn text(&self) -> &str {
    match self {
      Edit::Insert { text, .. } | Edit::Replace { text, .. } => text,
      Edit::Delete(_) => "",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
  #[error("position {0} is outside the document")]
  OutOfBounds(Position),
  #[error("edits overlap at {0}")]
  Overlap(Position),
  #[error("{0}")]
  Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
  /// Every match except the focused one.
  AllMatches,
  CurrentMatch,
}

pub trait Editor: Send {
  fn id(&self) -> EditorId;

  fn text(&self) -> String;

  fn selection(&self) -> Selection;

  fn set_selection(&mut self, selection: Selection);

  /// Applies every edit or none of them.
  fn apply(&mut self, edits: &[Edit]) -> Result<(), EditError>;

  fn line_count(&self) -> usize;

  fn line_text(&self, line: usize) -> Option<String>;

  /// Length of `line` in chars, excluding the line break.
  fn line_len(&self, line: usize) -> Option<usize> {
    self.line_text(line).map(|text| text.chars().count())
  }

  /// Column of the first non-whitespace char, or the line length if the line
  /// is blank.
  fn first_non_whitespace(&self, line: usize) -> Option<usize> {
    let text = self.line_text(line)?;
    Some(
      text
        .chars()
        .position(|ch| !ch.is_whitespace())
        .unwrap_or_else(|| text.chars().count()),
    )
  }

  /// Replaces the ranges painted with `kind`. An empty slice clears them.
  fn set_decorations(&mut self, kind: DecorationKind, ranges: &[Range]);
}
