use the_core::{
  DecorationKind,
  Editor,
  EditorId,
  Position,
  Range,
  chars::WordSeparators,
};

use crate::{
  document::{
    Document,
    Match,
    MatchError,
    MatchQuery,
  },
  error::{
    FindError,
    Result,
  },
};

/// Everything a refresh needs besides the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RefreshProps {
  pub query:                MatchQuery,
  /// Land on the match before the re-anchored one whenever the anchor moved.
  /// Reverse find types with this on.
  pub prev_match_on_change: bool,
}

/// Cursor over the live match set of exactly one editor.
///
/// The tracker remembers where the cursor was when it was last told, and
/// every refresh re-anchors the current match relative to that position. An
/// empty match set leaves no current match and makes navigation a no-op.
#[derive(Debug, Clone)]
pub struct MatchTracker {
  editor:      EditorId,
  cursor:      Position,
  matches:     Vec<Match>,
  current:     Option<usize>,
  suggestions: Vec<String>,
  error:       Option<MatchError>,
}

impl MatchTracker {
  pub fn new(editor: &dyn Editor) -> Self {
    Self {
      editor:      editor.id(),
      cursor:      editor.selection().start(),
      matches:     Vec::new(),
      current:     None,
      suggestions: Vec::new(),
      error:       None,
    }
  }

  pub fn editor_id(&self) -> EditorId {
    self.editor
  }

  /// Fails fast when handed a different editor than the one it was bound to.
  pub fn ensure_bound(&self, editor: &dyn Editor) -> Result<()> {
    if editor.id() == self.editor {
      Ok(())
    } else {
      Err(FindError::EditorMismatch {
        bound:  self.editor,
        active: editor.id(),
      })
    }
  }

  pub fn cursor(&self) -> Position {
    self.cursor
  }

  pub fn matches(&self) -> &[Match] {
    &self.matches
  }

  pub fn match_count(&self) -> usize {
    self.matches.len()
  }

  pub fn index(&self) -> Option<usize> {
    self.current
  }

  pub fn current(&self) -> Option<&Match> {
    self.current.and_then(|idx| self.matches.get(idx))
  }

  pub fn suggestions(&self) -> &[String] {
    &self.suggestions
  }

  /// Error from the most recent refresh, if it failed.
  pub fn error(&self) -> Option<&MatchError> {
    self.error.as_ref()
  }

  /// Out-of-range indices are ignored.
  pub fn set_index(&mut self, idx: usize) {
    if idx < self.matches.len() {
      self.current = Some(idx);
    }
  }

  pub fn next(&mut self) {
    self.step(1);
  }

  pub fn previous(&mut self) {
    self.step(-1);
  }

  /// Moves `offset` matches forward (negative is backward), wrapping around.
  pub fn step(&mut self, offset: isize) {
    let len = self.matches.len();
    if let Some(idx) = self.current {
      if len > 0 {
        let next = (idx as isize + offset).rem_euclid(len as isize);
        self.current = Some(next as usize);
      }
    }
  }

  /// Remembers the editor's current anchor as the reference cursor.
  pub fn update_cursor(&mut self, editor: &dyn Editor) {
    self.cursor = editor.selection().anchor;
  }

  /// Recomputes the match set and re-anchors the current match.
  ///
  /// An invalid pattern leaves the previous match set and index in place;
  /// the error is both returned and kept for display.
  pub fn refresh(
    &mut self,
    editor: &dyn Editor,
    props: &RefreshProps,
    separators: &WordSeparators,
  ) -> Result<()> {
    self.ensure_bound(editor)?;
    let set = match Document::new(editor.text()).matches(&props.query, separators) {
      Ok(set) => set,
      Err(err) => {
        self.error = Some(err.clone());
        return Err(err.into());
      },
    };
    self.error = None;
    self.suggestions = set.suggestions;
    self.matches = set.matches;

    let len = self.matches.len();
    if len == 0 {
      self.current = None;
      return Ok(());
    }

    let cursor = self.cursor;
    let mut idx = self.matches.partition_point(|m| m.range.start < cursor);
    if idx == len {
      // Past the last match: wrap to the top of the document.
      idx = 0;
    }
    if self.matches[idx].range.start != cursor && props.prev_match_on_change {
      idx = (idx + len - 1) % len;
    }
    self.current = Some(idx);
    Ok(())
  }

  /// Paints every match, highlighting the current one separately.
  pub fn decorate(&self, editor: &mut dyn Editor) {
    let current = self.current();
    let others: Vec<Range> = self
      .matches
      .iter()
      .filter(|m| current.is_none_or(|cur| cur.range != m.range))
      .map(|m| m.range)
      .collect();
    editor.set_decorations(DecorationKind::AllMatches, &others);
    let focused: Vec<Range> = current.map(|m| m.range).into_iter().collect();
    editor.set_decorations(DecorationKind::CurrentMatch, &focused);
  }

  pub fn clear_decorations(editor: &mut dyn Editor) {
    editor.set_decorations(DecorationKind::AllMatches, &[]);
    editor.set_decorations(DecorationKind::CurrentMatch, &[]);
  }
}

#[cfg(test)]
mod tests {
  use the_core::{
    MemoryEditor,
    Selection,
  };

  use super::*;

  fn props(query: &str) -> RefreshProps {
    RefreshProps {
      query:                MatchQuery::literal(query),
      prev_match_on_change: false,
    }
  }

  fn refreshed(editor: &MemoryEditor, props: &RefreshProps) -> MatchTracker {
    let mut tracker = MatchTracker::new(editor);
    tracker
      .refresh(editor, props, &WordSeparators::default())
      .unwrap();
    tracker
  }

  #[test]
  fn anchors_at_or_after_cursor() {
    let editor = MemoryEditor::new("ab ab ab ab").with_cursor((0, 4));
    let tracker = refreshed(&editor, &props("ab"));
    assert_eq!(tracker.index(), Some(2));

    let editor = MemoryEditor::new("ab ab ab ab").with_cursor((0, 3));
    assert_eq!(refreshed(&editor, &props("ab")).index(), Some(1));
  }

  #[test]
  fn wraps_to_first_match_past_the_end() {
    let editor = MemoryEditor::new("ab cd ab cd").with_cursor((0, 10));
    let tracker = refreshed(&editor, &props("ab"));
    assert_eq!(tracker.index(), Some(0));
  }

  #[test]
  fn previous_match_on_change() {
    let editor = MemoryEditor::new("ab ab ab").with_cursor((0, 4));
    let mut props = props("ab");
    props.prev_match_on_change = true;
    // Anchor is the match at col 6, which is not the cursor: step back.
    assert_eq!(refreshed(&editor, &props).index(), Some(1));

    // Cursor sits exactly on a match start: stay there.
    let editor = MemoryEditor::new("ab ab ab").with_cursor((0, 3));
    assert_eq!(refreshed(&editor, &props).index(), Some(1));

    // Stepping back from the first match wraps to the last.
    let editor = MemoryEditor::new(" ab ab").with_cursor((0, 0));
    assert_eq!(refreshed(&editor, &props).index(), Some(1));
  }

  #[test]
  fn navigation_wraps_and_noops_when_empty() {
    let editor = MemoryEditor::new("x x x");
    let mut tracker = refreshed(&editor, &props("x"));
    assert_eq!(tracker.index(), Some(0));
    tracker.previous();
    assert_eq!(tracker.index(), Some(2));
    tracker.next();
    tracker.next();
    assert_eq!(tracker.index(), Some(1));
    tracker.step(-4);
    assert_eq!(tracker.index(), Some(0));

    let mut empty = refreshed(&editor, &props("y"));
    empty.next();
    empty.previous();
    assert_eq!(empty.index(), None);
    assert!(empty.current().is_none());
  }

  #[test]
  fn invalid_pattern_keeps_previous_matches() {
    let editor = MemoryEditor::new("a(b a(b");
    let mut tracker = refreshed(&editor, &props("a"));
    tracker.next();
    let bad = RefreshProps {
      query:                MatchQuery::regex("a(b"),
      prev_match_on_change: false,
    };
    let err = tracker.refresh(&editor, &bad, &WordSeparators::default());
    assert!(matches!(err, Err(FindError::Match(_))));
    assert_eq!(tracker.match_count(), 2);
    assert_eq!(tracker.index(), Some(1));
    assert!(tracker.error().is_some());

    tracker
      .refresh(&editor, &props("a"), &WordSeparators::default())
      .unwrap();
    assert!(tracker.error().is_none());
  }

  #[test]
  fn refuses_a_different_editor() {
    let first = MemoryEditor::new("abc");
    let second = MemoryEditor::new("abc");
    let mut tracker = MatchTracker::new(&first);
    let err = tracker
      .refresh(&second, &props("a"), &WordSeparators::default())
      .unwrap_err();
    assert!(matches!(err, FindError::EditorMismatch { .. }));
  }

  #[test]
  fn decorations_split_current_from_rest() {
    let mut editor = MemoryEditor::new("x x x").with_cursor((0, 2));
    let tracker = refreshed(&editor, &props("x"));
    tracker.decorate(&mut editor);
    assert_eq!(
      editor.decorations(DecorationKind::CurrentMatch),
      vec![((0, 2), (0, 3)).into()]
    );
    assert_eq!(
      editor.decorations(DecorationKind::AllMatches),
      vec![((0, 0), (0, 1)).into(), ((0, 4), (0, 5)).into()]
    );

    MatchTracker::clear_decorations(&mut editor);
    assert!(editor.decorations(DecorationKind::AllMatches).is_empty());
    assert!(editor.decorations(DecorationKind::CurrentMatch).is_empty());
  }

  #[test]
  fn update_cursor_uses_anchor() {
    let mut editor = MemoryEditor::new("hello");
    let mut tracker = MatchTracker::new(&editor);
    editor.set_selection(Selection::new((0, 4).into(), (0, 1).into()));
    tracker.update_cursor(&editor);
    assert_eq!(tracker.cursor(), Position::new(0, 4));
  }
}
