//! Recording state and the command gate.
//!
//! Every command goes through [`Recorder::execute`]. The gate decides whether
//! the invocation is captured into the open book and guards against nested
//! commands being captured a second time: while a captured command runs,
//! `base_command` is false and anything it invokes is replayed by replaying
//! the outer command.

use std::{
  collections::{
    BTreeMap,
    BTreeSet,
    VecDeque,
  },
  panic::{
    self,
    AssertUnwindSafe,
  },
};

use serde_json::Value;
use thiserror::Error;

use crate::{
  app::App,
  book::RecordBook,
  commands::edit::CURSOR_MOVES,
  config::RecorderConfig,
  record::Record,
  registry::{
    CommandError,
    CommandResult,
  },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
  #[error("Recording name must not be empty")]
  Empty,
  #[error("Recording name must not start with \"{0}\"")]
  Reserved(String),
  #[error("A recording named \"{0}\" already exists")]
  Exists(String),
}

/// Where a book listed in a picker lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookRef {
  Recent(usize),
  Named(String),
}

#[derive(Debug, Clone)]
pub struct Recorder {
  /// Newest first. While recording, the front book is the open one.
  recent:          VecDeque<RecordBook>,
  named:           BTreeMap<String, RecordBook>,
  recording:       bool,
  base_command:    bool,
  max_recent:      usize,
  reserved_prefix: String,
}

impl Default for Recorder {
  fn default() -> Self {
    Self::new(&RecorderConfig::default())
  }
}

impl Recorder {
  pub fn new(config: &RecorderConfig) -> Self {
    Self {
      recent:          VecDeque::new(),
      named:           BTreeMap::new(),
      recording:       false,
      base_command:    true,
      max_recent:      config.max_recent.max(1),
      reserved_prefix: config.reserved_prefix.clone(),
    }
  }

  /// Drops every book and leaves recording mode.
  pub fn reset(&mut self) {
    self.recent.clear();
    self.named.clear();
    self.recording = false;
    self.base_command = true;
  }

  pub fn is_recording(&self) -> bool {
    self.recording
  }

  pub fn base_command(&self) -> bool {
    self.base_command
  }

  /// Opens a fresh book. Returns false if a recording is already running.
  pub fn start(&mut self) -> bool {
    if self.recording {
      return false;
    }
    self.recent.push_front(RecordBook::new());
    self.recording = true;
    tracing::debug!("recording started");
    true
  }

  /// Locks the open book and returns it. `None` if not recording.
  pub fn end(&mut self) -> Option<&RecordBook> {
    if !self.recording {
      return None;
    }
    self.recording = false;
    if let Some(book) = self.recent.front_mut() {
      book.trim_and_lock();
    }
    self.recent.truncate(self.max_recent);
    tracing::debug!(records = self.recent.front().map_or(0, RecordBook::len), "recording ended");
    self.recent.front()
  }

  pub fn active_book(&self) -> Option<&RecordBook> {
    if self.recording { self.recent.front() } else { None }
  }

  pub fn active_book_mut(&mut self) -> Option<&mut RecordBook> {
    if self.recording {
      self.recent.front_mut()
    } else {
      None
    }
  }

  /// Appends to the open book unless a captured command is already running.
  /// Returns whether the record was kept.
  pub fn add_record(&mut self, record: Record) -> bool {
    if !self.base_command {
      return false;
    }
    self.capture(record)
  }

  fn capture(&mut self, record: Record) -> bool {
    let Some(book) = self.active_book_mut() else {
      return false;
    };
    let kind = record.kind();
    match book.add_record(record) {
      Ok(()) => {
        tracing::debug!(%kind, "captured record");
        true
      },
      Err(err) => {
        tracing::warn!(%kind, %err, "record dropped");
        false
      },
    }
  }

  /// Most recently ended book.
  pub fn latest(&self) -> Option<&RecordBook> {
    if self.recording {
      self.recent.get(1)
    } else {
      self.recent.front()
    }
  }

  /// Ended recent books, newest first.
  pub fn recent(&self) -> impl Iterator<Item = &RecordBook> {
    self.recent.iter().skip(usize::from(self.recording))
  }

  pub fn named(&self) -> &BTreeMap<String, RecordBook> {
    &self.named
  }

  pub fn reserved_prefix(&self) -> &str {
    &self.reserved_prefix
  }

  pub fn recent_label(&self, idx: usize) -> String {
    format!("{} {idx}", self.reserved_prefix)
  }

  /// Resolves a picker label back to its book.
  pub fn lookup(&self, label: &str) -> Option<(BookRef, &RecordBook)> {
    if let Some(book) = self.named.get(label) {
      return Some((BookRef::Named(label.to_string()), book));
    }
    let idx = label
      .strip_prefix(self.reserved_prefix.as_str())?
      .trim_start()
      .parse::<usize>()
      .ok()?;
    let book = self.recent().nth(idx)?;
    Some((BookRef::Recent(idx), book))
  }

  pub fn validate_name(&self, name: &str) -> Result<(), NameError> {
    check_name(&self.reserved_prefix, |name| self.named.contains_key(name), name)
  }

  /// Detached copy of [`Recorder::validate_name`] for a prompt to run while
  /// the user types.
  pub fn name_validator(&self) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let prefix = self.reserved_prefix.clone();
    let taken: BTreeSet<String> = self.named.keys().cloned().collect();
    move |name: &str| {
      check_name(&prefix, |name| taken.contains(name), name)
        .err()
        .map(|err| err.to_string())
    }
  }

  /// Ends the running recording and stores it under `name`.
  pub fn save_active(&mut self, name: &str) -> Result<bool, NameError> {
    self.validate_name(name)?;
    let Some(book) = self.end().cloned() else {
      return Ok(false);
    };
    self.named.insert(name.to_string(), book);
    Ok(true)
  }

  /// Copies the `idx`-th recent book into the named table.
  pub fn save_recent(&mut self, idx: usize, name: &str) -> Result<bool, NameError> {
    self.validate_name(name)?;
    let Some(book) = self.recent().nth(idx).cloned() else {
      return Ok(false);
    };
    self.named.insert(name.to_string(), book);
    Ok(true)
  }

  /// Removes named books. Recent books are unaffected.
  pub fn delete<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> usize {
    names
      .into_iter()
      .filter(|name| self.named.remove(*name).is_some())
      .count()
  }

  fn should_capture(&self, id: &str, find_active: bool) -> bool {
    !is_control_command(id) && !find_active && self.recording && self.base_command
  }

  /// Runs a registered command, capturing it when appropriate.
  pub fn execute(app: &mut App, id: &str, args: &[Value]) -> CommandResult {
    let command = app
      .registry()
      .get(id)
      .cloned()
      .ok_or_else(|| CommandError::new(format!("Unknown command \"{id}\"")))?;

    if app.find().is_active() && CURSOR_MOVES.contains(&id) {
      app.end_find(true);
    }

    let find_active = app.find().is_active();
    if !app.recorder().should_capture(id, find_active) {
      return (command.fun)(app, args);
    }

    let recorder = app.recorder_mut();
    recorder.base_command = false;
    recorder.capture(Record::from_command(id, args));
    // Restored even when the command panics.
    let result = panic::catch_unwind(AssertUnwindSafe(|| (command.fun)(app, args)));
    app.recorder_mut().base_command = true;
    result.unwrap_or_else(|payload| panic::resume_unwind(payload))
  }
}

fn check_name(prefix: &str, taken: impl Fn(&str) -> bool, name: &str) -> Result<(), NameError> {
  if name.is_empty() {
    return Err(NameError::Empty);
  }
  if name.starts_with(prefix) {
    return Err(NameError::Reserved(prefix.to_string()));
  }
  if taken(name) {
    return Err(NameError::Exists(name.to_string()));
  }
  Ok(())
}

/// Record and find controls are never captured themselves.
pub fn is_control_command(id: &str) -> bool {
  id.starts_with("record.") || id.starts_with("find.") || id == "find" || id == "reverse_find"
}
