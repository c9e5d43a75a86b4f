use the_core::Editor;
use the_find::FindState;
use the_record::{
  MessageLevel,
  Record,
};
use the_test::Harness;

#[test]
fn recalled_query_is_recorded_like_a_typed_one() {
  let mut h = Harness::new("foo bar foo");
  h.record(|h| {
    h.find("foo")
      .ok("find.confirm", &[])
      .ok("cursor_right", &[])
      // An untouched query recalls the previous search.
      .ok("find", &[])
      .ok("find", &[])
      .ok("find.confirm", &[]);
  });
  assert_eq!(h.selected(), "foo");
  assert_eq!(h.editor.selection().start().col, 8);

  let book = h.app.recorder().latest().unwrap();
  assert_eq!(book.len(), 3);
  let Some(Record::Find(find)) = book.records().last() else {
    panic!("expected a find record");
  };
  assert_eq!(find.props.query.text, "foo");
  assert_eq!(find.nexts, 0);
}

#[test]
fn flags_travel_with_the_record() {
  let mut h = Harness::new("Foo foo Foo foo");
  h.ok("find.toggle_case_sensitive", &[]);
  h.record(|h| {
    h.find("foo").ok("find.confirm", &[]).type_text("x");
  });
  assert_eq!(h.text(), "Foo x Foo foo");

  h.ok("find.toggle_case_sensitive", &[]);
  assert!(!h.app.find().flags().case_sensitive);
  h.ok("record.play", &[]);
  assert_eq!(h.text(), "Foo x Foo x");
}

#[test]
fn invalid_pattern_is_shown_not_raised() {
  let mut h = Harness::new("xa ya");
  h.ok("find.toggle_regex", &[]).ok("find", &[]).type_text("(");
  let status = h.app.find().status().unwrap();
  assert!(status.error.is_some());
  assert_eq!(status.position, "No results");
  assert_eq!(status.flags, "Flags: [R]");
  assert!(h.messages().is_empty());

  h.type_text("a)");
  let status = h.app.find().status().unwrap();
  assert_eq!(status.error, None);
  assert_eq!(status.position, "1 of 2");
  assert_eq!(h.selected(), "a");
  assert_eq!(h.text(), "xa ya");
}

#[test]
fn replace_mode_ends_with_the_session() {
  let mut h = Harness::new("a1 a2 a3");
  h.find("a").ok("find.toggle_replace_mode", &[]);
  assert_eq!(h.app.find().state(), FindState::Replacing);
  h.type_text("b").ok("find.replace_one", &[]);
  assert_eq!(h.text(), "b1 a2 a3");
  assert_eq!(h.app.find().status().unwrap().position, "1 of 2");
  h.ok("find.replace_one", &[]).ok("find.confirm", &[]);
  assert_eq!(h.text(), "b1 b2 a3");
  assert_eq!(h.editor.selection().start().col, 6);

  h.ok("find", &[]);
  assert_eq!(h.app.find().state(), FindState::Searching);
  assert_eq!(h.app.find().status().unwrap().detail, None);
}

#[test]
fn forward_delete_is_refused_while_finding() {
  let mut h = Harness::new("abc");
  h.find("b");
  assert_eq!(h.err("delete_right", &[]), "Cannot delete forward while finding");
  assert_eq!(h.app.messages().latest().unwrap().level, MessageLevel::Info);
  assert_eq!(h.text(), "abc");
  assert!(h.app.find().is_active());
}

#[test]
fn cancelled_find_is_not_recorded() {
  let mut h = Harness::new("one two");
  h.record(|h| {
    h.find("two").ok("find.cancel", &[]).type_text("!");
  });
  let book = h.app.recorder().latest().unwrap();
  assert_eq!(book.len(), 1);
  assert!(matches!(book.records()[0], Record::Type(_)));
  // Cancel keeps the match selected, so the typing replaced it.
  assert_eq!(h.text(), "one !");
}
