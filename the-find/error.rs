use the_core::{
  EditError,
  EditorId,
};
use thiserror::Error;

use crate::document::MatchError;

pub type Result<T> = std::result::Result<T, FindError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindError {
  #[error("Editor must have focus for find")]
  NoEditor,
  #[error("find is bound to {bound} but {active} has focus")]
  EditorMismatch { bound: EditorId, active: EditorId },
  #[error(transparent)]
  Match(#[from] MatchError),
  #[error("find mode is not active")]
  Inactive,
  #[error("End of find cache")]
  NoNewerContext,
  #[error("No earlier find contexts available")]
  NoOlderContext,
  #[error("failed to replace matches: {0}")]
  Edit(#[from] EditError),
}

impl FindError {
  /// History boundaries are reported as information, not failures.
  pub fn is_info(&self) -> bool {
    matches!(self, FindError::NoNewerContext | FindError::NoOlderContext)
  }
}
