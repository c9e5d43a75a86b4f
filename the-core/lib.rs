//! Text primitives shared by the find engine and the recorder.
//!
//! Nothing in this crate knows about recordings or searches. It defines the
//! coordinates every other crate speaks in ([`position`]), how a flat string
//! maps onto those coordinates ([`line_index`]), what counts as a word
//! ([`chars`]), and the surface a host editor has to provide ([`editor`]).

pub mod chars;
pub mod editor;
pub mod line_index;
pub mod memory;
pub mod position;

pub use editor::{
  DecorationKind,
  Edit,
  EditError,
  Editor,
  EditorId,
};
pub use line_index::LineIndex;
pub use memory::MemoryEditor;
pub use position::{
  Position,
  Range,
  Selection,
};
