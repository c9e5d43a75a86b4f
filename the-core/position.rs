use std::fmt;

/// A single point in a text buffer.
/// 0-indexed as all things should be. `col` counts chars, not bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub line: usize,
  pub col:  usize,
}

impl Position {
  pub const fn new(line: usize, col: usize) -> Self {
    Self { line, col }
  }

  pub const fn zero() -> Self {
    Self { line: 0, col: 0 }
  }

  /// The position reached after inserting `text` at `self`.
  pub fn traverse(self, text: impl AsRef<str>) -> Self {
    let Self { mut line, mut col } = self;
    for ch in text.as_ref().chars() {
      if ch == '\n' {
        line += 1;
        col = 0;
      } else {
        col += 1;
      }
    }

    Self { line, col }
  }
}

impl From<(usize, usize)> for Position {
  fn from(value: (usize, usize)) -> Self {
    Position::new(value.0, value.1)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.col)
  }
}

/// Half-open `[start, end)` span between two positions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
  pub start: Position,
  pub end:   Position,
}

impl Range {
  /// Builds a range, swapping the ends if they are given backwards.
  pub fn new(start: Position, end: Position) -> Self {
    if end < start {
      Self {
        start: end,
        end:   start,
      }
    } else {
      Self { start, end }
    }
  }

  pub fn point(pos: Position) -> Self {
    Self {
      start: pos,
      end:   pos,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  pub fn contains(&self, pos: Position) -> bool {
    self.start <= pos && pos < self.end
  }
}

impl From<((usize, usize), (usize, usize))> for Range {
  fn from((start, end): ((usize, usize), (usize, usize))) -> Self {
    Range::new(start.into(), end.into())
  }
}

impl fmt::Display for Range {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.start, self.end)
  }
}

/// A selection keeps its direction: `anchor` is where it started, `active`
/// is where the cursor sits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
  pub anchor: Position,
  pub active: Position,
}

impl Selection {
  pub fn new(anchor: Position, active: Position) -> Self {
    Self { anchor, active }
  }

  pub fn point(pos: Position) -> Self {
    Self::new(pos, pos)
  }

  pub fn start(&self) -> Position {
    self.anchor.min(self.active)
  }

  pub fn end(&self) -> Position {
    self.anchor.max(self.active)
  }

  pub fn is_empty(&self) -> bool {
    self.anchor == self.active
  }

  pub fn range(&self) -> Range {
    Range::new(self.anchor, self.active)
  }
}

impl From<Range> for Selection {
  fn from(range: Range) -> Self {
    Self::new(range.start, range.end)
  }
}
