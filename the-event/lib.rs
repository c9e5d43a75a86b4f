//! Serialized command execution.
//!
//! Commands arrive from the host faster than they may finish. The
//! [`queue::CommandQueue`] makes sure they start in the order they were
//! received and never overlap.

pub mod queue;

pub use queue::{
  CommandQueue,
  JobOptions,
  QueueError,
  QueueWorker,
  SlowHook,
  Ticket,
};
