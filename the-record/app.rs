//! Application state.
//!
//! The `App` owns everything commands touch: configuration, the command
//! registry, the recorder, the find session, the focused editor and the host
//! prompt. It does not perform IO. Hosts either call [`App::execute`]
//! directly or hand the app to a [`Dispatcher`] that serializes commands on a
//! worker.

use std::{
  sync::Arc,
  time::Duration,
};

use serde_json::Value;
use the_core::Editor;
use the_event::{
  CommandQueue,
  JobOptions,
  QueueError,
  QueueWorker,
  SlowHook,
  Ticket,
};
use the_find::FindSession;

use crate::{
  commands,
  config::Config,
  host::Prompt,
  messages::Messages,
  record::{
    FindRecord,
    Record,
  },
  recorder::Recorder,
  registry::{
    CommandError,
    CommandRegistry,
    CommandResult,
  },
};

pub struct App {
  config:   Config,
  registry: CommandRegistry,
  recorder: Recorder,
  find:     FindSession,
  editor:   Option<Box<dyn Editor>>,
  prompt:   Box<dyn Prompt>,
  messages: Messages,
}

impl App {
  /// App with the built-in commands registered and no editor.
  pub fn new(config: Config, prompt: impl Prompt + 'static) -> Self {
    let mut registry = CommandRegistry::new();
    commands::register_builtins(&mut registry);
    Self {
      recorder: Recorder::new(&config.recorder),
      find: FindSession::new(config.find.max_contexts, config.find.separators()),
      config,
      registry,
      editor: None,
      prompt: Box::new(prompt),
      messages: Messages::default(),
    }
  }

  pub fn with_editor(mut self, editor: impl Editor + 'static) -> Self {
    self.set_editor(Some(Box::new(editor)));
    self
  }

  /// Moves focus. An active find is cancelled first since it is bound to the
  /// editor losing focus.
  pub fn set_editor(&mut self, editor: Option<Box<dyn Editor>>) {
    self.end_find(false);
    self.editor = editor;
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn registry(&self) -> &CommandRegistry {
    &self.registry
  }

  pub fn registry_mut(&mut self) -> &mut CommandRegistry {
    &mut self.registry
  }

  pub fn recorder(&self) -> &Recorder {
    &self.recorder
  }

  pub fn recorder_mut(&mut self) -> &mut Recorder {
    &mut self.recorder
  }

  pub fn find(&self) -> &FindSession {
    &self.find
  }

  pub fn find_mut(&mut self) -> &mut FindSession {
    &mut self.find
  }

  pub fn editor(&self) -> Option<&dyn Editor> {
    self.editor.as_deref()
  }

  pub fn editor_mut(&mut self) -> Option<&mut dyn Editor> {
    let editor: &mut dyn Editor = self.editor.as_mut()?.as_mut();
    Some(editor)
  }

  /// The find session together with the focused editor it works on.
  pub fn find_parts(&mut self) -> Option<(&mut FindSession, &mut dyn Editor)> {
    let editor: &mut dyn Editor = self.editor.as_mut()?.as_mut();
    Some((&mut self.find, editor))
  }

  pub fn prompt_mut(&mut self) -> &mut dyn Prompt {
    self.prompt.as_mut()
  }

  pub fn messages(&self) -> &Messages {
    &self.messages
  }

  /// Leaves find mode. A confirmed, non-empty search is offered to the open
  /// book as a find record. Returns false if find was not active.
  pub fn end_find(&mut self, confirm: bool) -> bool {
    let Some((find, editor)) = self.find_parts() else {
      return false;
    };
    let Some(capture) = find.end(editor) else {
      return false;
    };
    if confirm && !capture.props.query.text.is_empty() {
      self.recorder.add_record(Record::Find(FindRecord::new(capture)));
    }
    true
  }

  /// Runs a command through the recorder gate. Nothing is reported; this is
  /// what nested commands and playback use.
  pub fn run(&mut self, id: &str, args: &[Value]) -> CommandResult {
    Recorder::execute(self, id, args)
  }

  /// Runs a command and publishes its rejection, if any.
  pub fn execute(&mut self, id: &str, args: &[Value]) -> CommandResult {
    let result = self.run(id, args);
    if let Err(err) = &result {
      self.report(id, err);
    }
    result
  }

  pub fn report(&self, source: &str, err: &CommandError) {
    tracing::debug!(command = source, error = %err, "command rejected");
    self.messages.publish(err.level, Some(source), err.message.clone());
  }

  /// Forgets recordings and find history.
  pub fn reset(&mut self) {
    self.end_find(false);
    self.recorder.reset();
    self.find.reset();
  }

  /// Moves the app onto a command queue worker. Commands sent through the
  /// returned dispatcher start in the order they were sent; one that runs
  /// past `recorder.command_timeout_ms` gets a warning message.
  pub fn serve(self) -> Result<(Dispatcher, QueueWorker<App>), QueueError> {
    let messages = self.messages.clone();
    let registry = self.registry.clone();
    let timeout = self.config.command_timeout();
    let on_slow: SlowHook = Arc::new(move |name: &str, _timeout: Duration| {
      messages.warning(Some(name), format!("Command \"{name}\" is taking too long"));
    });
    let (queue, worker) = CommandQueue::spawn(self, timeout, Some(on_slow))?;
    Ok((Dispatcher { queue, registry }, worker))
  }
}

/// Sends commands to a served [`App`].
#[derive(Clone)]
pub struct Dispatcher {
  queue:    CommandQueue<App>,
  registry: CommandRegistry,
}

impl Dispatcher {
  fn options(&self, id: &str) -> JobOptions {
    JobOptions {
      no_timeout: self.registry.options(id).no_timeout,
    }
  }

  /// Queues a command without waiting for it.
  pub fn send(&self, id: &str, args: Vec<Value>) -> Result<Ticket<CommandResult>, QueueError> {
    let command = id.to_string();
    self
      .queue
      .enqueue(id, self.options(id), move |app: &mut App| app.execute(&command, &args))
  }

  pub async fn dispatch(&self, id: &str, args: Vec<Value>) -> Result<CommandResult, QueueError> {
    self.send(id, args)?.wait().await
  }

  /// Runs arbitrary work against the app in queue order.
  pub async fn inspect<R, F>(&self, f: F) -> Result<R, QueueError>
  where
    R: Send + 'static,
    F: FnOnce(&mut App) -> R + Send + 'static,
  {
    self.queue.submit("inspect", JobOptions::no_timeout(), f).await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use the_core::MemoryEditor;

  use super::*;
  use crate::{
    host::NoPrompt,
    messages::MessageLevel,
    registry::CommandOptions,
  };

  fn app(text: &str) -> (App, MemoryEditor) {
    let editor = MemoryEditor::new(text);
    let app = App::new(Config::default(), NoPrompt).with_editor(editor.clone());
    (app, editor)
  }

  #[test]
  fn execute_reports_one_message_per_rejection() {
    let (mut app, _editor) = app("text");
    assert!(app.execute("nope", &[]).is_err());
    assert!(app.execute("record.end", &[]).is_err());
    assert!(app.execute("record.start", &[]).is_ok());

    let history = app.messages().history();
    let texts: Vec<_> = history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec![
      "Unknown command \"nope\"",
      "Not recording!",
      "Recording started!",
    ]);
    assert_eq!(history[0].level, MessageLevel::Error);
    assert_eq!(history[1].level, MessageLevel::Info);
    assert_eq!(history[1].source.as_deref(), Some("record.end"));
  }

  #[test]
  fn run_does_not_report() {
    let (mut app, _editor) = app("text");
    assert!(app.run("nope", &[]).is_err());
    assert!(app.messages().history().is_empty());
  }

  #[test]
  fn composite_commands_are_captured_once() {
    let (mut app, editor) = app("abcdef");
    app.registry_mut().register("skip_two", "", CommandOptions::default(), |app, _| {
      app.run("cursor_right", &[])?;
      app.run("cursor_right", &[])
    });
    app.run("record.start", &[]).unwrap();
    app.run("skip_two", &[]).unwrap();
    app.run("record.end", &[]).unwrap();

    let book = app.recorder().latest().unwrap();
    assert_eq!(book.records(), &[Record::from_command("skip_two", &[])]);
    assert_eq!(the_core::Editor::selection(&editor).active.col, 2);
    assert!(app.recorder().base_command());
  }

  #[test]
  fn confirmed_find_is_recorded_and_cancelled_find_is_not() {
    let (mut app, _editor) = app("foo bar foo");
    app.run("record.start", &[]).unwrap();
    app.run("find", &[json!("foo")]).unwrap();
    app.run("find.cancel", &[]).unwrap();
    app.run("find", &[json!("bar")]).unwrap();
    app.run("type", &[json!("!")]).unwrap();
    app.run("find.confirm", &[]).unwrap();
    app.run("find", &[]).unwrap();
    app.run("find.confirm", &[]).unwrap();
    app.run("record.end", &[]).unwrap();

    let book = app.recorder().latest().unwrap();
    assert_eq!(book.len(), 1);
    let Record::Find(find) = &book.records()[0] else {
      panic!("expected a find record");
    };
    assert_eq!(find.props.query.text, "bar!");
  }

  #[test]
  fn cursor_moves_confirm_find_first() {
    let (mut app, editor) = app("one two three");
    app.run("record.start", &[]).unwrap();
    app.run("find", &[json!("two")]).unwrap();
    app.run("cursor_right", &[]).unwrap();
    assert!(!app.find().is_active());
    assert_eq!(the_core::Editor::selection(&editor).active.col, 7);
    app.run("record.end", &[]).unwrap();

    let kinds: Vec<_> = app
      .recorder()
      .latest()
      .unwrap()
      .records()
      .iter()
      .map(Record::kind)
      .collect();
    assert_eq!(kinds, vec![
      crate::record::RecordKind::Find,
      crate::record::RecordKind::Command,
    ]);
  }

  #[test]
  fn focus_change_cancels_find() {
    let (mut app, _editor) = app("abc");
    app.run("find", &[json!("b")]).unwrap();
    app.set_editor(Some(Box::new(MemoryEditor::new("other"))));
    assert!(!app.find().is_active());
  }

  #[test]
  fn reset_forgets_recordings_and_find_history() {
    let (mut app, _editor) = app("abc");
    app.run("record.start", &[]).unwrap();
    app.run("find", &[json!("b")]).unwrap();
    app.run("find.confirm", &[]).unwrap();
    app.run("record.end", &[]).unwrap();
    assert!(app.recorder().latest().is_some());
    assert_eq!(app.find().contexts().len(), 1);

    app.run("record.start", &[]).unwrap();
    app.reset();
    assert!(!app.recorder().is_recording());
    assert!(app.recorder().latest().is_none());
    assert_eq!(app.find().contexts().len(), 0);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn served_app_runs_commands_in_send_order() {
    let (app, editor) = app("");
    let (dispatcher, worker) = app.serve().unwrap();
    let first = dispatcher.send("type", vec![json!("a")]).unwrap();
    let second = dispatcher.send("type", vec![json!("b")]).unwrap();
    assert_eq!(second.wait().await.unwrap(), Ok(()));
    assert_eq!(first.wait().await.unwrap(), Ok(()));
    assert_eq!(editor.contents(), "ab");

    let rejected = dispatcher.dispatch("record.end", Vec::new()).await.unwrap();
    assert!(rejected.is_err());

    drop(dispatcher);
    let app = worker.join().await.unwrap();
    assert_eq!(app.messages().texts(), vec!["Not recording!"]);
  }
}
