//! Find mode.
//!
//! A [`FindSession`] owns the history of find contexts and, while active, a
//! [`MatchTracker`] bound to the editor find was started in. Every keystroke
//! that changes the query re-runs the match engine against a fresh snapshot of
//! the editor text.
//!
//! Context history works like shell history: starting find pushes a fresh
//! context, ending find drops it again if nothing was typed, and the user can
//! walk back to older queries while active.

use std::collections::VecDeque;

use smallvec::SmallVec;
use the_core::{
  Edit,
  Editor,
  Selection,
  chars::WordSeparators,
};

use crate::{
  document::{
    MatchQuery,
    build_regex,
    replacement_for,
  },
  error::{
    FindError,
    Result,
  },
  tracker::{
    MatchTracker,
    RefreshProps,
  },
};

pub const DEFAULT_MAX_CONTEXTS: usize = 100;

/// One search frame of the history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindContext {
  pub query:       String,
  pub replacement: String,
  /// False for a freshly pushed frame nobody has typed into yet.
  pub modified:    bool,
}

impl FindContext {
  fn is_blank(&self) -> bool {
    self.query.is_empty() && self.replacement.is_empty()
  }

  fn same_text(&self, other: &FindContext) -> bool {
    self.query == other.query && self.replacement == other.replacement
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindState {
  Inactive,
  Searching,
  Replacing,
}

/// Search toggles. They survive across find sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindFlags {
  pub case_sensitive: bool,
  pub whole_word:     bool,
  pub regex:          bool,
}

impl FindFlags {
  /// `C`, `W` and `R` for each flag that is on, in that order.
  pub fn codes(&self) -> String {
    let mut codes = String::with_capacity(3);
    if self.case_sensitive {
      codes.push('C');
    }
    if self.whole_word {
      codes.push('W');
    }
    if self.regex {
      codes.push('R');
    }
    codes
  }
}

/// What a finished find session leaves behind for the recorder: the query
/// configuration of the last refresh and the net number of next/previous
/// steps taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCapture {
  pub nexts: isize,
  pub props: RefreshProps,
}

/// Snapshot of find mode for the host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindStatus {
  pub label:       String,
  /// Present in replace mode.
  pub detail:      Option<String>,
  pub flags:       String,
  pub position:    String,
  pub error:       Option<String>,
  pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FindSession {
  contexts:     VecDeque<FindContext>,
  context_idx:  usize,
  max_contexts: usize,
  separators:   WordSeparators,
  flags:        FindFlags,
  replace_mode: bool,
  prev_on_type: bool,
  active:       bool,
  tracker:      Option<MatchTracker>,
  /// Match index from before each typed query char, popped on backspace.
  cursor_stack: SmallVec<[Option<usize>; 16]>,
  nexts:        isize,
  last_props:   RefreshProps,
}

impl Default for FindSession {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_CONTEXTS, WordSeparators::default())
  }
}

impl FindSession {
  pub fn new(max_contexts: usize, separators: WordSeparators) -> Self {
    Self {
      contexts: VecDeque::new(),
      context_idx: 0,
      max_contexts: max_contexts.max(1),
      separators,
      flags: FindFlags::default(),
      replace_mode: false,
      prev_on_type: false,
      active: false,
      tracker: None,
      cursor_stack: SmallVec::new(),
      nexts: 0,
      last_props: RefreshProps::default(),
    }
  }

  /// Forgets history and toggles. Used to isolate tests.
  pub fn reset(&mut self) {
    *self = Self::new(self.max_contexts, self.separators.clone());
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn state(&self) -> FindState {
    match (self.active, self.replace_mode) {
      (false, _) => FindState::Inactive,
      (true, false) => FindState::Searching,
      (true, true) => FindState::Replacing,
    }
  }

  pub fn flags(&self) -> FindFlags {
    self.flags
  }

  pub fn contexts(&self) -> impl ExactSizeIterator<Item = &FindContext> {
    self.contexts.iter()
  }

  pub fn context_index(&self) -> usize {
    self.context_idx
  }

  pub fn context(&self) -> Option<&FindContext> {
    self.contexts.get(self.context_idx)
  }

  pub fn tracker(&self) -> Option<&MatchTracker> {
    self.tracker.as_ref()
  }

  pub fn nexts(&self) -> isize {
    self.nexts
  }

  pub fn last_props(&self) -> &RefreshProps {
    &self.last_props
  }

  pub fn separators(&self) -> &WordSeparators {
    &self.separators
  }

  pub fn cursor_depth(&self) -> usize {
    self.cursor_stack.len()
  }

  /// Live number of matches, zero when inactive.
  pub fn match_count(&self) -> usize {
    self.tracker.as_ref().map_or(0, MatchTracker::match_count)
  }

  /// Enters find mode in `editor`. `prev_on_type` makes every query change
  /// land on the match before the cursor, which is how reverse find behaves.
  pub fn start(
    &mut self,
    editor: &mut dyn Editor,
    prev_on_type: bool,
    initial: Option<&str>,
  ) -> Result<()> {
    self.nexts = 0;
    self.last_props = RefreshProps::default();
    self.cursor_stack.clear();
    self.tracker = Some(MatchTracker::new(editor));
    self.active = true;
    self.prev_on_type = prev_on_type;

    let query = initial.unwrap_or_default();
    self.contexts.push_back(FindContext {
      query:       query.to_string(),
      replacement: String::new(),
      modified:    !query.is_empty(),
    });
    while self.contexts.len() > self.max_contexts {
      self.contexts.pop_front();
    }
    self.context_idx = self.contexts.len() - 1;

    tracing::debug!(editor = %editor.id(), prev_on_type, "find started");
    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  /// Appends typed text to the query, or to the replacement in replace mode.
  pub fn insert_text(&mut self, editor: &mut dyn Editor, text: &str) -> Result<()> {
    self.ensure_editor(editor)?;
    let replace_mode = self.replace_mode;
    let ctx = self.current_context_mut()?;
    ctx.modified = true;
    if replace_mode {
      // The replacement never changes which ranges match.
      ctx.replacement.push_str(text);
    } else {
      ctx.query.push_str(text);
      let before = self.tracker.as_ref().and_then(MatchTracker::index);
      self
        .cursor_stack
        .extend(std::iter::repeat_n(before, text.chars().count()));
      self.refresh(editor)?;
    }
    self.focus(editor);
    Ok(())
  }

  /// Backspace. Restores the match index from before the deleted query char
  /// was typed instead of re-anchoring.
  pub fn delete_char(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.ensure_editor(editor)?;
    let replace_mode = self.replace_mode;
    let ctx = self.current_context_mut()?;
    if replace_mode {
      if ctx.replacement.pop().is_some() {
        ctx.modified = true;
      }
    } else if ctx.query.pop().is_some() {
      ctx.modified = true;
      self.refresh(editor)?;
      if let Some(Some(idx)) = self.cursor_stack.pop() {
        if let Some(tracker) = self.tracker.as_mut() {
          tracker.set_index(idx);
        }
      }
    }
    self.focus(editor);
    Ok(())
  }

  /// Replaces the whole query, e.g. when a suggestion is accepted.
  pub fn set_query(&mut self, editor: &mut dyn Editor, query: &str) -> Result<()> {
    self.ensure_editor(editor)?;
    let ctx = self.current_context_mut()?;
    ctx.modified = true;
    ctx.query = query.to_string();
    self.cursor_stack.clear();
    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  pub fn toggle_regex(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.flags.regex = !self.flags.regex;
    self.refocus(editor)
  }

  pub fn toggle_case_sensitive(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.flags.case_sensitive = !self.flags.case_sensitive;
    self.refocus(editor)
  }

  pub fn toggle_whole_word(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.flags.whole_word = !self.flags.whole_word;
    self.refocus(editor)
  }

  pub fn toggle_replace_mode(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.replace_mode = !self.replace_mode;
    self.refocus(editor)
  }

  pub fn next_match(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.step_match(editor, 1)
  }

  pub fn prev_match(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.step_match(editor, -1)
  }

  /// Moves to a newer context in the history.
  pub fn next_context(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.ensure_editor(editor)?;
    if self.context_idx + 1 >= self.contexts.len() {
      return Err(FindError::NoNewerContext);
    }
    self.context_idx += 1;
    self.cursor_stack.clear();
    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  /// Moves to an older context in the history.
  pub fn prev_context(&mut self, editor: &mut dyn Editor) -> Result<()> {
    self.ensure_editor(editor)?;
    if self.context_idx == 0 {
      return Err(FindError::NoOlderContext);
    }
    self.context_idx -= 1;
    self.cursor_stack.clear();
    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  /// Replaces the current match, or every match, in one edit batch.
  pub fn replace(&mut self, editor: &mut dyn Editor, all: bool) -> Result<()> {
    self.ensure_editor(editor)?;
    let Some(tracker) = self.tracker.as_ref() else {
      return Err(FindError::Inactive);
    };
    if let Some(err) = tracker.error() {
      return Err(err.clone().into());
    }
    let targets = if all {
      tracker.matches().to_vec()
    } else {
      tracker.current().cloned().into_iter().collect()
    };
    if targets.is_empty() {
      return Ok(());
    }

    let replacement = self
      .context()
      .map(|ctx| ctx.replacement.clone())
      .unwrap_or_default();
    let regex = build_regex(&self.last_props.query)?;
    let edits: Vec<Edit> = targets
      .iter()
      .map(|m| {
        Edit::Replace {
          range: m.range,
          text:  replacement_for(&regex, &m.text, &replacement, self.flags.regex),
        }
      })
      .collect();
    editor.apply(&edits)?;
    tracing::debug!(replaced = edits.len(), "replaced matches");

    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  /// Leaves find mode, selecting the current match. Returns what a recorder
  /// needs to replay the search, or `None` if find was not active.
  pub fn end(&mut self, editor: &mut dyn Editor) -> Option<FindCapture> {
    if !self.active {
      return None;
    }
    if let Some(tracker) = self.tracker.take() {
      if tracker.ensure_bound(editor).is_ok() {
        if let Some(current) = tracker.current() {
          editor.set_selection(Selection::new(current.range.start, current.range.end));
        }
        MatchTracker::clear_decorations(editor);
      }
    }
    self.active = false;

    if self.contexts.back().is_some_and(FindContext::is_blank) {
      self.contexts.pop_back();
    }
    while self.contexts.len() >= 2 {
      let last = self.contexts.len() - 1;
      if !self.contexts[last].same_text(&self.contexts[last - 1]) {
        break;
      }
      self.contexts.pop_back();
    }
    self.context_idx = self.contexts.len().saturating_sub(1);

    self.replace_mode = false;
    self.prev_on_type = false;
    self.cursor_stack.clear();
    tracing::debug!(contexts = self.contexts.len(), "find ended");
    Some(FindCapture {
      nexts: self.nexts,
      props: self.last_props.clone(),
    })
  }

  pub fn status(&self) -> Option<FindStatus> {
    if !self.active {
      return None;
    }
    let tracker = self.tracker.as_ref()?;
    let ctx = self.context()?;

    let label = with_visible_trailing_space(&ctx.query);
    let detail = self.replace_mode.then(|| {
      if ctx.replacement.is_empty() {
        "No replace text set".to_string()
      } else {
        with_visible_trailing_space(&ctx.replacement)
      }
    });
    let position = match tracker.index() {
      Some(idx) => format!("{} of {}", idx + 1, tracker.match_count()),
      None => "No results".to_string(),
    };
    let suggestions = if tracker.current().is_some() {
      Vec::new()
    } else {
      tracker.suggestions().to_vec()
    };

    Some(FindStatus {
      label: if label.is_empty() { " ".into() } else { label },
      detail,
      flags: format!("Flags: [{}]", self.flags.codes()),
      position,
      error: tracker.error().map(|err| err.message.clone()),
      suggestions,
    })
  }

  fn step_match(&mut self, editor: &mut dyn Editor, offset: isize) -> Result<()> {
    self.ensure_editor(editor)?;
    // Searching again from an untouched frame recalls the previous query.
    let recall = self.contexts.len() >= 2
      && self.context_idx == self.contexts.len() - 1
      && self.contexts.back().is_some_and(|ctx| !ctx.modified);
    if recall {
      self.contexts.pop_back();
      self.context_idx = self.contexts.len() - 1;
      self.cursor_stack.clear();
      self.refresh(editor)?;
      self.focus(editor);
      return Ok(());
    }

    self.nexts += offset;
    if let Some(tracker) = self.tracker.as_mut() {
      tracker.step(offset);
    }
    self.focus(editor);
    if let Some(tracker) = self.tracker.as_mut() {
      tracker.update_cursor(editor);
    }
    Ok(())
  }

  fn refocus(&mut self, editor: &mut dyn Editor) -> Result<()> {
    if !self.active {
      return Ok(());
    }
    self.ensure_editor(editor)?;
    self.refresh(editor)?;
    self.focus(editor);
    Ok(())
  }

  fn ensure_editor(&self, editor: &dyn Editor) -> Result<()> {
    if !self.active {
      return Err(FindError::Inactive);
    }
    match self.tracker.as_ref() {
      Some(tracker) => tracker.ensure_bound(editor),
      None => Err(FindError::Inactive),
    }
  }

  fn current_context_mut(&mut self) -> Result<&mut FindContext> {
    self
      .contexts
      .get_mut(self.context_idx)
      .ok_or(FindError::Inactive)
  }

  /// Re-runs the match engine. A bad pattern is kept on the tracker for
  /// display and does not fail the keystroke that produced it.
  fn refresh(&mut self, editor: &dyn Editor) -> Result<()> {
    let query = self
      .context()
      .map(|ctx| ctx.query.clone())
      .unwrap_or_default();
    self.last_props = RefreshProps {
      query:                MatchQuery {
        text:             query,
        case_insensitive: !self.flags.case_sensitive,
        regex:            self.flags.regex,
        whole_word:       self.flags.whole_word,
      },
      prev_match_on_change: self.prev_on_type,
    };
    let Some(tracker) = self.tracker.as_mut() else {
      return Err(FindError::Inactive);
    };
    match tracker.refresh(editor, &self.last_props, &self.separators) {
      Ok(()) => Ok(()),
      Err(FindError::Match(err)) => {
        tracing::debug!(error = %err, "invalid find pattern");
        Ok(())
      },
      Err(err) => Err(err),
    }
  }

  /// Paints matches and moves the selection onto the current one, or back to
  /// the reference cursor when nothing matches.
  fn focus(&self, editor: &mut dyn Editor) {
    let Some(tracker) = self.tracker.as_ref() else {
      return;
    };
    tracker.decorate(editor);
    match tracker.current() {
      Some(current) => {
        editor.set_selection(Selection::new(current.range.start, current.range.end));
      },
      None => editor.set_selection(Selection::point(tracker.cursor())),
    }
  }
}

fn with_visible_trailing_space(text: &str) -> String {
  if text.ends_with(' ') {
    format!("{text}|")
  } else {
    text.to_string()
  }
}
