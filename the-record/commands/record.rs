//! Record-control commands.
//!
//! Books are cloned out of the recorder before they are played: playback runs
//! commands against the same application state that owns the recorder.

use std::panic::{
  self,
  AssertUnwindSafe,
};

use serde_json::Value;

use super::count_arg;
use crate::{
  app::App,
  book::RecordBook,
  host::{
    InputRequest,
    PickButton,
    PickItem,
    PickOutcome,
    PickRequest,
  },
  record::Record,
  recorder::BookRef,
  registry::{
    CommandError,
    CommandOptions,
    CommandRegistry,
    CommandResult,
  },
};

pub const START: &str = "record.start";
pub const END: &str = "record.end";
pub const SAVE_AS: &str = "record.save_as";
pub const DELETE: &str = "record.delete";
pub const PLAY: &str = "record.play";
pub const PLAY_NAMED: &str = "record.play_named";
pub const PLAY_REPEAT: &str = "record.play_repeat";
pub const PLAY_N_TIMES: &str = "record.play_n_times";
pub const UNDO: &str = "record.undo";

pub(crate) fn register(registry: &mut CommandRegistry) {
  let plain = CommandOptions::default();
  let long = CommandOptions { no_timeout: true };
  registry.register(START, "Start recording", plain, cmd_start);
  registry.register(END, "End recording", plain, cmd_end);
  registry.register(SAVE_AS, "End recording and save it under a name", long, cmd_save_as);
  registry.register(DELETE, "Delete named recordings", long, cmd_delete);
  registry.register(PLAY, "Play the latest recording", long, cmd_play);
  registry.register(PLAY_NAMED, "Choose a recording to play", long, cmd_play_named);
  registry.register(PLAY_REPEAT, "Repeat the latest recording until its find runs out", long, cmd_play_repeat);
  registry.register(PLAY_N_TIMES, "Play the latest recording a number of times", long, cmd_play_n_times);
  registry.register(UNDO, "Undo the last recorded action", plain, cmd_undo);
}

fn not_while_recording(app: &App) -> CommandResult {
  if app.recorder().is_recording() {
    return Err(CommandError::info("Still recording!"));
  }
  Ok(())
}

fn latest(app: &App) -> Result<RecordBook, CommandError> {
  not_while_recording(app)?;
  app
    .recorder()
    .latest()
    .cloned()
    .ok_or_else(|| CommandError::new("No recordings to play"))
}

fn cmd_start(app: &mut App, _args: &[Value]) -> CommandResult {
  if !app.recorder_mut().start() {
    return Err(CommandError::info("Already recording!"));
  }
  app.messages().info(Some(START), "Recording started!");
  Ok(())
}

fn cmd_end(app: &mut App, _args: &[Value]) -> CommandResult {
  if app.recorder_mut().end().is_none() {
    return Err(CommandError::info("Not recording!"));
  }
  app.messages().info(Some(END), "Recording ended!");
  Ok(())
}

fn ask_name(app: &mut App) -> Result<String, CommandError> {
  let request = InputRequest::new("Recording name")
    .placeholder("Name for this recording")
    .validate(app.recorder().name_validator());
  let name = app
    .prompt_mut()
    .input(request)
    .ok_or_else(|| CommandError::new("No recording name provided"))?;
  // Hosts are free to ignore the validator.
  app
    .recorder()
    .validate_name(&name)
    .map_err(|err| CommandError::new(err.to_string()))?;
  Ok(name)
}

fn cmd_save_as(app: &mut App, _args: &[Value]) -> CommandResult {
  if !app.recorder().is_recording() {
    return Err(CommandError::new("Not recording!"));
  }
  let name = ask_name(app)?;
  app
    .recorder_mut()
    .save_active(&name)
    .map_err(|err| CommandError::new(err.to_string()))?;
  app.messages().info(Some(SAVE_AS), format!("Recording saved as \"{name}\"!"));
  Ok(())
}

fn cmd_delete(app: &mut App, _args: &[Value]) -> CommandResult {
  not_while_recording(app)?;
  let items: Vec<PickItem> = app.recorder().named().keys().map(PickItem::new).collect();
  if items.is_empty() {
    return Err(CommandError::info("No named recordings"));
  }
  let outcome = app.prompt_mut().pick(PickRequest {
    title: "Recordings to delete".to_string(),
    items,
    multi: true,
  });
  let names = match outcome {
    Some(PickOutcome::Selected(names)) if !names.is_empty() => names,
    _ => return Err(CommandError::new("No recording chosen")),
  };
  let deleted = app.recorder_mut().delete(names.iter().map(String::as_str));
  let noun = if deleted == 1 { "recording" } else { "recordings" };
  app.messages().info(Some(DELETE), format!("Deleted {deleted} {noun}"));
  Ok(())
}

fn play(app: &mut App, mut book: RecordBook) -> CommandResult {
  book
    .playback(app)
    .map_err(|err| CommandError::new(err.to_string()))
}

fn repeat(app: &mut App, mut book: RecordBook) -> CommandResult {
  book
    .repeated_playback(app)
    .map(|_| ())
    .map_err(|err| CommandError::new(err.to_string()))
}

/// Pre-filled count for the N-times prompt: live matches of the leading find
/// when there is one.
fn suggested_count(app: &App, book: &RecordBook) -> usize {
  match book.records().first() {
    Some(Record::Find(find)) => find.count_matches(app).unwrap_or(1).max(1),
    _ => 1,
  }
}

fn parse_count(value: &str) -> Result<usize, String> {
  match value.trim().parse::<usize>() {
    Ok(count) if count > 0 => Ok(count),
    _ => Err("Please enter a positive whole number".to_string()),
  }
}

fn n_times(app: &mut App, mut book: RecordBook, count: Option<usize>) -> CommandResult {
  let times = match count {
    Some(times) => times,
    None => {
      let request = InputRequest::new("Number of times to play")
        .value(suggested_count(app, &book).to_string())
        .validate(|value| parse_count(value).err());
      let answer = app
        .prompt_mut()
        .input(request)
        .ok_or_else(|| CommandError::new("No count provided"))?;
      parse_count(&answer).map_err(CommandError::new)?
    },
  };
  book.n_times_playback(app, times).map(|_| ()).map_err(|(run, err)| {
    tracing::debug!(run, times, "n-times playback stopped");
    CommandError::new(err.to_string())
  })
}

fn cmd_play(app: &mut App, _args: &[Value]) -> CommandResult {
  let book = latest(app)?;
  play(app, book)
}

fn cmd_play_repeat(app: &mut App, _args: &[Value]) -> CommandResult {
  let book = latest(app)?;
  repeat(app, book)
}

fn cmd_play_n_times(app: &mut App, args: &[Value]) -> CommandResult {
  let count = match args.first() {
    None => None,
    Some(_) => Some(count_arg(PLAY_N_TIMES, args)?),
  };
  let book = latest(app)?;
  n_times(app, book, count)
}

fn cmd_play_named(app: &mut App, _args: &[Value]) -> CommandResult {
  not_while_recording(app)?;
  let recorder = app.recorder();
  let mut items: Vec<PickItem> = (0..recorder.recent().count())
    .map(|idx| {
      PickItem::new(recorder.recent_label(idx)).with_buttons(&[
        PickButton::Repeat,
        PickButton::NTimes,
        PickButton::Save,
      ])
    })
    .collect();
  items.extend(
    recorder
      .named()
      .keys()
      .map(|name| PickItem::new(name).with_buttons(&[PickButton::Repeat, PickButton::NTimes])),
  );
  if items.is_empty() {
    return Err(CommandError::new("No recordings to play"));
  }

  let outcome = app.prompt_mut().pick(PickRequest {
    title: "Recording to play".to_string(),
    items,
    multi: false,
  });
  let (label, button) = match outcome {
    Some(PickOutcome::Selected(labels)) => {
      match labels.into_iter().next() {
        Some(label) => (label, None),
        None => return Err(CommandError::new("No recording chosen")),
      }
    },
    Some(PickOutcome::Button { label, button }) => (label, Some(button)),
    None => return Err(CommandError::new("No recording chosen")),
  };

  let Some((place, book)) = app.recorder().lookup(&label) else {
    return Err(CommandError::new(format!("Unknown recording \"{label}\"")));
  };
  let book = book.clone();
  match button {
    None => play(app, book),
    Some(PickButton::Repeat) => repeat(app, book),
    Some(PickButton::NTimes) => n_times(app, book, None),
    Some(PickButton::Save) => {
      let BookRef::Recent(idx) = place else {
        return Err(CommandError::new("Only recent recordings can be saved"));
      };
      let name = ask_name(app)?;
      app
        .recorder_mut()
        .save_recent(idx, &name)
        .map_err(|err| CommandError::new(err.to_string()))?;
      app.messages().info(Some(PLAY_NAMED), format!("Recording saved as \"{name}\"!"));
      Ok(())
    },
  }
}

fn cmd_undo(app: &mut App, _args: &[Value]) -> CommandResult {
  let Some(open) = app.recorder_mut().active_book_mut() else {
    return Err(CommandError::info("Not recording!"));
  };
  let mut book = std::mem::take(open);
  let result = panic::catch_unwind(AssertUnwindSafe(|| book.undo(app)));
  if let Some(open) = app.recorder_mut().active_book_mut() {
    *open = book;
  }
  result
    .unwrap_or_else(|payload| panic::resume_unwind(payload))
    .map_err(|err| CommandError::new(err.to_string()))
}
