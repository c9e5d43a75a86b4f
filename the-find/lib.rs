//! Incremental find.
//!
//! Three layers, leaf first:
//!
//! - [`document`]: a text snapshot that computes every match of a query.
//! - [`tracker`]: a cursor over the live match set of one editor.
//! - [`session`]: the stack of find contexts driven by keystrokes.

pub mod document;
pub mod error;
pub mod session;
pub mod tracker;

pub use document::{
  Document,
  Match,
  MatchError,
  MatchQuery,
  MatchSet,
};
pub use error::FindError;
pub use session::{
  FindCapture,
  FindContext,
  FindFlags,
  FindSession,
  FindState,
  FindStatus,
};
pub use tracker::{
  MatchTracker,
  RefreshProps,
};
