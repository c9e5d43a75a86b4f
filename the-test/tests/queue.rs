use std::{
  thread,
  time::Duration,
};

use serde_json::json;
use the_core::MemoryEditor;
use the_record::{
  App,
  CommandOptions,
  Config,
  MessageLevel,
  NoPrompt,
};

fn app(text: &str, timeout_ms: u64) -> (App, MemoryEditor) {
  let mut config = Config::default();
  config.recorder.command_timeout_ms = timeout_ms;
  let editor = MemoryEditor::new(text);
  let mut app = App::new(config, NoPrompt).with_editor(editor.clone());
  app
    .registry_mut()
    .register("slow", "", CommandOptions::default(), |_, _| {
      thread::sleep(Duration::from_millis(80));
      Ok(())
    });
  app
    .registry_mut()
    .register("slow_playback", "", CommandOptions { no_timeout: true }, |_, _| {
      thread::sleep(Duration::from_millis(80));
      Ok(())
    });
  (app, editor)
}

#[tokio::test(flavor = "current_thread")]
async fn slow_command_is_reported_and_still_finishes() -> anyhow::Result<()> {
  let (app, editor) = app("", 10);
  let (dispatcher, worker) = app.serve()?;

  let slow = dispatcher.send("slow", Vec::new())?;
  let typed = dispatcher.send("type", vec![json!("after")])?;
  assert_eq!(slow.wait().await?, Ok(()));
  assert_eq!(typed.wait().await?, Ok(()));
  assert_eq!(editor.contents(), "after");

  drop(dispatcher);
  let app = worker.join().await?;
  let history = app.messages().history();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].level, MessageLevel::Warning);
  assert_eq!(history[0].text, "Command \"slow\" is taking too long");
  Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn long_running_commands_skip_the_watchdog() -> anyhow::Result<()> {
  let (app, _editor) = app("", 10);
  let (dispatcher, worker) = app.serve()?;
  assert_eq!(dispatcher.dispatch("slow_playback", Vec::new()).await?, Ok(()));
  drop(dispatcher);
  assert!(worker.join().await?.messages().history().is_empty());
  Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn recording_through_the_queue() -> anyhow::Result<()> {
  let (app, editor) = app("a b a", 5_000);
  let (dispatcher, worker) = app.serve()?;
  for (id, args) in [
    ("record.start", vec![]),
    ("find", vec![json!("a")]),
    ("find.confirm", vec![]),
    ("type", vec![json!("c")]),
    ("record.end", vec![]),
    ("record.play", vec![]),
  ] {
    assert_eq!(dispatcher.dispatch(id, args).await?, Ok(()), "{id}");
  }
  assert_eq!(editor.contents(), "c b c");

  let recording = dispatcher
    .inspect(|app| app.recorder().is_recording())
    .await?;
  assert!(!recording);
  drop(dispatcher);
  worker.join().await?;
  Ok(())
}
