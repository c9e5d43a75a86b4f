//! Byte offset <-> [`Position`] conversion over an immutable string.
//!
//! The index stores the byte offset at which every line starts. Finding the
//! line of an offset is a binary search over those starts; the column is then
//! the number of chars between the line start and the offset.

use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
  /// Byte offset of the first byte of each line. Never empty.
  starts: Vec<usize>,
  len:    usize,
}

impl LineIndex {
  pub fn new(text: &str) -> Self {
    let mut starts = Vec::with_capacity(text.len() / 32 + 1);
    starts.push(0);
    starts.extend(
      text
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'\n')
        .map(|(idx, _)| idx + 1),
    );
    Self {
      starts,
      len: text.len(),
    }
  }

  #[inline]
  pub fn line_count(&self) -> usize {
    self.starts.len()
  }

  pub fn line_start(&self, line: usize) -> Option<usize> {
    self.starts.get(line).copied()
  }

  /// Byte offset just past the last char of `line`, excluding the `\n`.
  pub fn line_end(&self, line: usize) -> Option<usize> {
    self.starts.get(line)?;
    Some(match self.starts.get(line + 1) {
      Some(next) => next - 1,
      None => self.len,
    })
  }

  /// Line containing the byte at `offset`. Offsets past the end land on the
  /// last line.
  pub fn line_of(&self, offset: usize) -> usize {
    self.starts.partition_point(|start| *start <= offset) - 1
  }

  /// `offset` must lie on a char boundary of `text`.
  pub fn position(&self, text: &str, offset: usize) -> Position {
    let offset = offset.min(self.len);
    let line = self.line_of(offset);
    let col = text[self.starts[line]..offset].chars().count();
    Position::new(line, col)
  }

  /// Byte offset of `pos`, or `None` when the line does not exist or the
  /// column lies past the end of the line.
  pub fn offset(&self, text: &str, pos: Position) -> Option<usize> {
    let start = self.line_start(pos.line)?;
    let end = self.line_end(pos.line)?;
    let line = &text[start..end];
    if pos.col == 0 {
      return Some(start);
    }
    let mut chars = line.char_indices().skip(pos.col);
    match chars.next() {
      Some((idx, _)) => Some(start + idx),
      None if line.chars().count() == pos.col => Some(end),
      None => None,
    }
  }
}
