use std::sync::{
  Arc,
  atomic::{
    AtomicUsize,
    Ordering,
  },
};

use serde_json::json;
use the_core::Edit;
use the_record::CommandOptions;
use the_test::Harness;

/// Registers a command that deletes the selection on its first `times` calls
/// and does nothing afterwards.
fn register_shrink(h: &mut Harness, times: usize) {
  let calls = Arc::new(AtomicUsize::new(0));
  h.app
    .registry_mut()
    .register("shrink", "", CommandOptions::default(), move |app, _| {
      if calls.fetch_add(1, Ordering::SeqCst) >= times {
        return Ok(());
      }
      let Some(editor) = app.editor_mut() else {
        return Ok(());
      };
      let range = editor.selection().range();
      editor
        .apply(&[Edit::Delete(range)])
        .map_err(|err| the_record::CommandError::new(err.to_string()))
    });
}

#[test]
fn decreasing_mode_replaces_every_occurrence() {
  let mut h = Harness::new("foo x foo y foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("bar");
  });
  assert_eq!(h.text(), "bar x foo y foo");

  h.ok("record.play_repeat", &[]);
  assert_eq!(h.text(), "bar x bar y bar");
  // Running out of matches is how a decreasing repeat ends.
  assert!(h.messages().iter().all(|m| !m.contains("did not decrease")));
  assert_eq!(h.last_message().as_deref(), Some("Recording ended!"));
}

#[test]
fn decreasing_then_plateau_is_reported() {
  // The mode is fixed by the second find. Here the count drops once (3 -> 2)
  // and then stays put, so the repeat is judged decreasing and fails on the
  // plateau instead of switching to stable mode.
  let mut h = Harness::new("foo foo foo foo");
  register_shrink(&mut h, 2);
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).ok("shrink", &[]);
  });
  assert_eq!(h.text(), " foo foo foo");

  let message = h.err("record.play_repeat", &[]);
  assert_eq!(message, "Number of matches did not decrease (was 2, now 2)");
  assert_eq!(h.text(), "  foo foo");
  assert_eq!(h.last_message().as_deref(), Some(message.as_str()));
}

#[test]
fn stable_mode_visits_every_match_once() {
  let mut h = Harness::new("foo foo foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("FOO");
  });
  assert_eq!(h.text(), "FOO foo foo");

  h.ok("record.play_repeat", &[]);
  assert_eq!(h.text(), "FOO FOO FOO");
  assert_eq!(h.last_message().as_deref(), Some("Recording ended!"));
}

#[test]
fn stable_mode_rejects_revisiting_a_match() {
  let mut h = Harness::new("foo foo foo");
  h.record(|h| {
    // The cursor move confirms the find on its own.
    h.find("foo").ok("cursor_home", &[]);
  });

  let message = h.err("record.play_repeat", &[]);
  assert_eq!(
    message,
    "Find landed on same match index (0) before visiting all 3 matches"
  );
}

#[test]
fn stable_mode_rejects_count_changes() {
  let mut h = Harness::new("foo bar foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("foofoo");
  });

  let message = h.err("record.play_repeat", &[]);
  assert_eq!(message, "Match count changed from 3 to 4");
  assert_eq!(h.text(), "foofoo bar foofoo");
}

#[test]
fn repeat_needs_a_leading_find() {
  let mut h = Harness::new("");
  h.record(|h| {
    h.type_text("x");
  });
  assert_eq!(
    h.err("record.play_repeat", &[]),
    "Recording does not begin with a find, so it cannot be repeated"
  );
}

#[test]
fn first_find_failure_is_reported() {
  let mut h = Harness::new("foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("bar");
  });
  assert_eq!(
    h.err("record.play_repeat", &[]),
    "No match found during recording playback"
  );
  assert_eq!(h.text(), "bar");
}

#[test]
fn failing_entry_stops_the_loop() {
  let mut h = Harness::new("foo foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("bar");
  });
  h.editor.set_read_only(true);
  let message = h.err("record.play_repeat", &[]);
  assert_eq!(message, "document is read-only");
  assert_eq!(h.text(), "bar foo");
  assert_eq!(
    h.messages()
      .iter()
      .filter(|m| m.as_str() == message)
      .count(),
    1
  );
}

#[test]
fn playback_is_refused_while_recording() {
  let mut h = Harness::new("foo");
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]);
  });
  h.ok("record.start", &[]);
  for id in ["record.play", "record.play_repeat", "record.play_n_times", "record.play_named"] {
    assert_eq!(h.err(id, &[json!(1)]), "Still recording!");
  }
}
