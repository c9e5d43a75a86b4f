//! Notifications.
//!
//! Every command outcome the user should hear about ends up here as exactly
//! one [`Message`]. Each message carries a sequence number; a host keeps the
//! last one it rendered and asks for [`Messages::since`] that. The log sits
//! behind a shared handle so the command queue's watchdog can publish while a
//! command still holds the application state.

use std::{
  collections::VecDeque,
  sync::Arc,
};

use parking_lot::Mutex;
use serde::{
  Deserialize,
  Serialize,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
  Info,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Strictly increasing, starting at 1. Never reused, even after a clear.
  pub seq:    u64,
  pub level:  MessageLevel,
  /// Command that produced the message, when there is one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  pub text:   String,
}

#[derive(Debug)]
struct Log {
  entries:  VecDeque<Message>,
  last_seq: u64,
  limit:    usize,
}

impl Log {
  fn push(&mut self, level: MessageLevel, source: Option<&str>, text: String) -> Message {
    self.last_seq += 1;
    let message = Message {
      seq: self.last_seq,
      level,
      source: source.map(str::to_string),
      text,
    };
    if self.entries.len() == self.limit {
      self.entries.pop_front();
    }
    self.entries.push_back(message.clone());
    message
  }
}

/// Shared handle to the message log. Clones publish into the same log.
#[derive(Debug, Clone)]
pub struct Messages {
  log: Arc<Mutex<Log>>,
}

impl Default for Messages {
  fn default() -> Self {
    Self::with_limit(DEFAULT_HISTORY_LIMIT)
  }
}

impl Messages {
  /// Keeps at most `limit` messages; older ones fall off the front.
  pub fn with_limit(limit: usize) -> Self {
    Self {
      log: Arc::new(Mutex::new(Log {
        entries:  VecDeque::new(),
        last_seq: 0,
        limit:    limit.max(1),
      })),
    }
  }

  pub fn publish(&self, level: MessageLevel, source: Option<&str>, text: impl Into<String>) -> Message {
    let message = self.log.lock().push(level, source, text.into());
    tracing::debug!(seq = message.seq, level = ?message.level, source = ?message.source, text = %message.text, "message");
    message
  }

  pub fn info(&self, source: Option<&str>, text: impl Into<String>) {
    self.publish(MessageLevel::Info, source, text);
  }

  pub fn warning(&self, source: Option<&str>, text: impl Into<String>) {
    self.publish(MessageLevel::Warning, source, text);
  }

  pub fn error(&self, source: Option<&str>, text: impl Into<String>) {
    self.publish(MessageLevel::Error, source, text);
  }

  pub fn latest(&self) -> Option<Message> {
    self.log.lock().entries.back().cloned()
  }

  /// Sequence number of the newest message ever published, 0 if none.
  pub fn last_seq(&self) -> u64 {
    self.log.lock().last_seq
  }

  /// Retained messages published after `seq`, oldest first.
  pub fn since(&self, seq: u64) -> Vec<Message> {
    let log = self.log.lock();
    let skip = log.entries.partition_point(|message| message.seq <= seq);
    log.entries.range(skip..).cloned().collect()
  }

  pub fn history(&self) -> Vec<Message> {
    self.since(0)
  }

  /// Texts of the retained history, oldest first.
  pub fn texts(&self) -> Vec<String> {
    self
      .log
      .lock()
      .entries
      .iter()
      .map(|message| message.text.clone())
      .collect()
  }

  /// Forgets retained messages. Sequence numbers keep counting.
  pub fn clear(&self) {
    self.log.lock().entries.clear();
  }
}
