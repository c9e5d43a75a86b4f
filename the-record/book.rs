use crate::{
  app::App,
  record::{
    Record,
    RecordError,
    Result,
  },
  repeat::{
    self,
    RepeatError,
    RepeatSummary,
  },
};

/// One recording session.
///
/// An open book accepts new records and can undo its latest one. Ending the
/// recording compacts the book and locks it; from then on it is replayed but
/// never changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBook {
  records: Vec<Record>,
  locked:  bool,
}

impl RecordBook {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  pub(crate) fn records_mut(&mut self) -> &mut [Record] {
    &mut self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn is_locked(&self) -> bool {
    self.locked
  }

  pub fn add_record(&mut self, record: Record) -> Result<()> {
    if self.locked {
      return Err(RecordError::Locked);
    }
    self.records.push(record);
    Ok(())
  }

  /// Compacts the book in a single left-to-right pass and locks it. Does
  /// nothing on an already locked book.
  pub fn trim_and_lock(&mut self) {
    if self.locked {
      return;
    }
    let before = self.records.len();
    let mut kept: Vec<Record> = Vec::with_capacity(before);
    for record in self.records.drain(..) {
      if let Some(last) = kept.last_mut() {
        if last.eat(&record) {
          if last.noop() {
            kept.pop();
          }
          continue;
        }
      }
      if !record.noop() {
        kept.push(record);
      }
    }
    self.records = kept;
    self.locked = true;
    tracing::debug!(before, after = self.records.len(), "trimmed record book");
  }

  /// Replays every record in order, stopping at the first failure. Effects of
  /// the records that already ran stay in place.
  pub fn playback(&mut self, app: &mut App) -> Result<()> {
    self.trim_and_lock();
    for (idx, record) in self.records.iter_mut().enumerate() {
      if let Err(err) = record.playback(app) {
        tracing::warn!(entry = idx, kind = %record.kind(), %err, "playback stopped");
        return Err(err);
      }
    }
    Ok(())
  }

  /// Straight playback `times` times. Returns how many runs completed before
  /// the error, if any.
  pub fn n_times_playback(&mut self, app: &mut App, times: usize) -> std::result::Result<usize, (usize, RecordError)> {
    for run in 0..times {
      self.playback(app).map_err(|err| (run, err))?;
    }
    Ok(times)
  }

  /// Reverts and drops the latest record of a book that is still open.
  pub fn undo(&mut self, app: &mut App) -> Result<()> {
    if self.locked {
      return Err(RecordError::UndoLocked);
    }
    let Some(last) = self.records.last() else {
      return Err(RecordError::NothingToUndo);
    };
    last.undo(app)?;
    self.records.pop();
    Ok(())
  }

  /// Repeat playback needs a leading find to steer by.
  pub fn repeatable(&self) -> bool {
    matches!(self.records.first(), Some(Record::Find(_)))
  }

  pub fn repeated_playback(&mut self, app: &mut App) -> std::result::Result<RepeatSummary, RepeatError> {
    repeat::run(self, app)
  }
}
