//! Keyboard macro recording.
//!
//! Commands run through the [`Recorder`] gate. While recording, each top-level
//! command is captured as a [`Record`] into the open [`RecordBook`]; a
//! confirmed incremental find is captured as a single find record. Ended books
//! can be replayed once, a fixed number of times, or repeatedly until the
//! leading find runs out of matches.

pub mod app;
pub mod book;
pub mod commands;
pub mod config;
pub mod host;
pub mod messages;
pub mod record;
pub mod recorder;
pub mod registry;
pub mod repeat;

pub use app::{
  App,
  Dispatcher,
};
pub use book::RecordBook;
pub use config::{
  Config,
  ConfigError,
};
pub use host::{
  InputRequest,
  NoPrompt,
  PickButton,
  PickItem,
  PickOutcome,
  PickRequest,
  Prompt,
};
pub use messages::{
  Message,
  MessageLevel,
  Messages,
};
pub use record::{
  FindMiss,
  FindRecord,
  Record,
  RecordError,
  RecordKind,
};
pub use recorder::{
  NameError,
  Recorder,
};
pub use registry::{
  CommandError,
  CommandOptions,
  CommandRegistry,
  CommandResult,
};
pub use repeat::{
  RepeatError,
  RepeatSummary,
  Trend,
};
