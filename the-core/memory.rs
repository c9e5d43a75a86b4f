//! In-memory [`Editor`] implementation.
//!
//! Headless hosts and tests drive the behavior layer against this buffer. The
//! handle is cheap to clone and every clone sees the same state, so a caller
//! can hand one clone to the application context and keep another to inspect
//! the document afterwards.

use std::{
  collections::HashMap,
  sync::Arc,
};

use parking_lot::Mutex;

use crate::{
  editor::{
    DecorationKind,
    Edit,
    EditError,
    Editor,
    EditorId,
  },
  line_index::LineIndex,
  position::{
    Position,
    Range,
    Selection,
  },
};

#[derive(Debug, Default)]
struct Buffer {
  text:        String,
  selection:   Selection,
  decorations: HashMap<DecorationKind, Vec<Range>>,
  read_only:   bool,
  revision:    u64,
}

impl Buffer {
  /// Sets the selection, pulling both ends back inside the document.
  fn reselect(&mut self, selection: Selection) {
    let index = LineIndex::new(&self.text);
    let anchor = self.clamp(&index, selection.anchor);
    let active = self.clamp(&index, selection.active);
    self.selection = Selection::new(anchor, active);
  }

  fn clamp(&self, index: &LineIndex, pos: Position) -> Position {
    let last = index.line_count() - 1;
    if pos.line > last {
      return index.position(&self.text, self.text.len());
    }
    let (start, end) = match (index.line_start(pos.line), index.line_end(pos.line)) {
      (Some(start), Some(end)) => (start, end),
      _ => return Position::zero(),
    };
    let len = self.text[start..end].chars().count();
    Position::new(pos.line, pos.col.min(len))
  }
}

#[derive(Debug, Clone)]
pub struct MemoryEditor {
  id:    EditorId,
  inner: Arc<Mutex<Buffer>>,
}

impl MemoryEditor {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      id:    EditorId::next(),
      inner: Arc::new(Mutex::new(Buffer {
        text: text.into(),
        ..Buffer::default()
      })),
    }
  }

  pub fn from_lines(lines: &[&str]) -> Self {
    Self::new(lines.join("\n"))
  }

  pub fn with_cursor(self, pos: impl Into<Position>) -> Self {
    self.select(Selection::point(pos.into()));
    self
  }

  pub fn contents(&self) -> String {
    self.inner.lock().text.clone()
  }

  pub fn lines(&self) -> Vec<String> {
    self.inner.lock().text.split('\n').map(str::to_string).collect()
  }

  pub fn set_contents(&self, text: impl Into<String>) {
    let mut buffer = self.inner.lock();
    buffer.text = text.into();
    buffer.revision += 1;
    let sel = buffer.selection;
    buffer.reselect(sel);
  }

  pub fn decorations(&self, kind: DecorationKind) -> Vec<Range> {
    self
      .inner
      .lock()
      .decorations
      .get(&kind)
      .cloned()
      .unwrap_or_default()
  }

  /// Makes every subsequent [`Editor::apply`] fail, the way a host rejects
  /// edits to a read-only document.
  pub fn set_read_only(&self, read_only: bool) {
    self.inner.lock().read_only = read_only;
  }

  /// Number of successful edit batches so far.
  pub fn revision(&self) -> u64 {
    self.inner.lock().revision
  }

  fn select(&self, selection: Selection) {
    let mut buffer = self.inner.lock();
    buffer.reselect(selection);
  }
}

impl Editor for MemoryEditor {
  fn id(&self) -> EditorId {
    self.id
  }

  fn text(&self) -> String {
    self.contents()
  }

  fn selection(&self) -> Selection {
    self.inner.lock().selection
  }

  fn set_selection(&mut self, selection: Selection) {
    self.select(selection);
  }

  fn apply(&mut self, edits: &[Edit]) -> Result<(), EditError> {
    let mut buffer = self.inner.lock();
    if buffer.read_only {
      return Err(EditError::Rejected("document is read-only".to_string()));
    }

    let index = LineIndex::new(&buffer.text);
    let mut spans = Vec::with_capacity(edits.len());
    for edit in edits {
      let range = edit.range();
      let start = index
        .offset(&buffer.text, range.start)
        .ok_or(EditError::OutOfBounds(range.start))?;
      let end = index
        .offset(&buffer.text, range.end)
        .ok_or(EditError::OutOfBounds(range.end))?;
      spans.push((start, end, range.start, edit.text()));
    }
    // Stable, so inserts at the same point keep their batch order.
    spans.sort_by_key(|(start, end, ..)| (*start, *end));
    for pair in spans.windows(2) {
      if pair[1].0 < pair[0].1 {
        return Err(EditError::Overlap(pair[1].2));
      }
    }

    let mut text = String::with_capacity(buffer.text.len());
    let mut cursor = 0;
    for (start, end, _, insert) in &spans {
      text.push_str(&buffer.text[cursor..*start]);
      text.push_str(insert);
      cursor = *end;
    }
    text.push_str(&buffer.text[cursor..]);
    buffer.text = text;
    buffer.revision += 1;

    let sel = buffer.selection;
    buffer.reselect(sel);
    Ok(())
  }

  fn line_count(&self) -> usize {
    LineIndex::new(&self.inner.lock().text).line_count()
  }

  fn line_text(&self, line: usize) -> Option<String> {
    let buffer = self.inner.lock();
    let index = LineIndex::new(&buffer.text);
    let start = index.line_start(line)?;
    let end = index.line_end(line)?;
    Some(buffer.text[start..end].to_string())
  }

  fn set_decorations(&mut self, kind: DecorationKind, ranges: &[Range]) {
    self.inner.lock().decorations.insert(kind, ranges.to_vec());
  }
}
