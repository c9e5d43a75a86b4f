//! Repeat playback.
//!
//! Replays a "find X, edit it" book across every remaining occurrence of X.
//! The leading find is replayed before each pass and its live match count
//! decides whether the loop is making progress:
//!
//! - decreasing: each edit destroys the match it landed on, so the count must
//!   shrink on every pass until nothing matches any more.
//! - stable: each edit mutates the match in place, so the count must stay put
//!   and every pass must land on a match index not visited before. The loop
//!   succeeds once every index has been visited.
//!
//! The mode is settled by the second find: a lower count than the first means
//! decreasing, anything else means stable. It is never revisited, so a count
//! that drops once and then plateaus ends with [`RepeatError::DidNotDecrease`].

use std::collections::HashSet;

use thiserror::Error;

use crate::{
  app::App,
  book::RecordBook,
  record::{
    Record,
    RecordError,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
  Decreasing,
  Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepeatError {
  #[error("Recording does not begin with a find, so it cannot be repeated")]
  NotRepeatable,
  /// The very first find failed. This is the only find error worth showing
  /// as is.
  #[error("{0}")]
  First(RecordError),
  #[error("Number of matches did not decrease (was {previous}, now {count})")]
  DidNotDecrease { previous: usize, count: usize },
  #[error("Match count changed from {from} to {to}")]
  CountChanged { from: usize, to: usize },
  #[error("Find landed on same match index ({index}) before visiting all {count} matches")]
  SameIndex { index: usize, count: usize },
  /// A record after the leading find failed; the loop stops where it is.
  #[error("{0}")]
  Entry(RecordError),
}

/// How a successful repeat went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSummary {
  /// Completed passes, the first one included.
  pub runs:  usize,
  /// `None` when the loop ended before a second find settled it.
  pub trend: Option<Trend>,
}

pub(crate) fn run(book: &mut RecordBook, app: &mut App) -> Result<RepeatSummary, RepeatError> {
  book.trim_and_lock();
  let records = book.records_mut();
  let Some((Record::Find(find), rest)) = records.split_first_mut() else {
    return Err(RepeatError::NotRepeatable);
  };

  let first = find.playback(app).map_err(RepeatError::First)?;
  let mut previous = first.count;
  let mut visited = HashSet::from([first.index]);
  let mut trend = None;
  let mut runs = 0;
  play_rest(rest, app)?;
  runs += 1;

  loop {
    let hit = match find.playback(app) {
      Ok(hit) => hit,
      Err(RecordError::Find(miss)) => {
        let count = miss.count();
        return match trend {
          Some(Trend::Stable) => Err(RepeatError::CountChanged { from: previous, to: count }),
          _ if count < previous => {
            tracing::debug!(runs, "repeat playback exhausted matches");
            Ok(RepeatSummary { runs, trend })
          },
          _ => Err(RepeatError::DidNotDecrease { previous, count }),
        };
      },
      Err(err) => return Err(RepeatError::Entry(err)),
    };

    let count = hit.count;
    let mode = *trend.get_or_insert(if count < previous {
      Trend::Decreasing
    } else {
      Trend::Stable
    });
    match mode {
      Trend::Decreasing => {
        if count >= previous {
          return Err(RepeatError::DidNotDecrease { previous, count });
        }
      },
      Trend::Stable => {
        if count != previous {
          return Err(RepeatError::CountChanged { from: previous, to: count });
        }
        if !visited.insert(hit.index) {
          if visited.len() == count {
            tracing::debug!(runs, "repeat playback visited every match");
            return Ok(RepeatSummary { runs, trend });
          }
          return Err(RepeatError::SameIndex {
            index: hit.index,
            count,
          });
        }
      },
    }

    previous = count;
    play_rest(rest, app)?;
    runs += 1;
  }
}

fn play_rest(rest: &mut [Record], app: &mut App) -> Result<(), RepeatError> {
  for record in rest {
    if let Err(err) = record.playback(app) {
      tracing::warn!(kind = %record.kind(), %err, "repeat playback stopped");
      return Err(RepeatError::Entry(err));
    }
  }
  Ok(())
}
