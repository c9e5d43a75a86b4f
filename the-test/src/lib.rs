//! Scripted host for end-to-end tests.
//!
//! [`ScriptedPrompt`] answers prompts from a queue and remembers what it was
//! asked. [`Harness`] wires an [`App`] to a [`MemoryEditor`] and that prompt,
//! keeping handles to both so a test can drive commands and then inspect the
//! document, the prompts and the published messages.

use std::{
  collections::VecDeque,
  sync::Arc,
};

use parking_lot::Mutex;
use serde_json::Value;
use the_core::{
  Editor,
  MemoryEditor,
  Selection,
};
use the_record::{
  App,
  CommandResult,
  Config,
  InputRequest,
  PickButton,
  PickOutcome,
  PickRequest,
  Prompt,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
  Input(Option<String>),
  Pick(Option<PickOutcome>),
}

/// One prompt as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asked {
  Input {
    title:      String,
    value:      Option<String>,
    /// What the validator said about the scripted answer.
    validation: Option<String>,
  },
  Pick(PickRequest),
}

#[derive(Debug, Default)]
struct Script {
  answers: VecDeque<Answer>,
  asked:   Vec<Asked>,
}

/// Clones share one script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
  script: Arc<Mutex<Script>>,
}

impl ScriptedPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn answer(&self, answer: Answer) -> &Self {
    self.script.lock().answers.push_back(answer);
    self
  }

  pub fn input(&self, value: &str) -> &Self {
    self.answer(Answer::Input(Some(value.to_string())))
  }

  pub fn dismiss_input(&self) -> &Self {
    self.answer(Answer::Input(None))
  }

  pub fn select(&self, labels: &[&str]) -> &Self {
    let labels = labels.iter().map(|label| label.to_string()).collect();
    self.answer(Answer::Pick(Some(PickOutcome::Selected(labels))))
  }

  pub fn press(&self, label: &str, button: PickButton) -> &Self {
    self.answer(Answer::Pick(Some(PickOutcome::Button {
      label: label.to_string(),
      button,
    })))
  }

  pub fn asked(&self) -> Vec<Asked> {
    self.script.lock().asked.clone()
  }

  pub fn pending(&self) -> usize {
    self.script.lock().answers.len()
  }
}

impl Prompt for ScriptedPrompt {
  fn input(&mut self, request: InputRequest) -> Option<String> {
    let mut script = self.script.lock();
    let answer = match script.answers.pop_front() {
      Some(Answer::Input(answer)) => answer,
      Some(other) => panic!("input \"{}\" asked, but the script has {other:?}", request.title),
      None => None,
    };
    let validation = answer.as_deref().and_then(|value| request.check(value));
    script.asked.push(Asked::Input {
      title: request.title.clone(),
      value: request.value.clone(),
      validation,
    });
    answer
  }

  fn pick(&mut self, request: PickRequest) -> Option<PickOutcome> {
    let mut script = self.script.lock();
    let answer = match script.answers.pop_front() {
      Some(Answer::Pick(answer)) => answer,
      Some(other) => panic!("pick \"{}\" asked, but the script has {other:?}", request.title),
      None => None,
    };
    script.asked.push(Asked::Pick(request));
    answer
  }
}

pub struct Harness {
  pub app:    App,
  pub editor: MemoryEditor,
  pub prompt: ScriptedPrompt,
}

impl Harness {
  pub fn new(text: &str) -> Self {
    Self::with_config(text, Config::default())
  }

  pub fn with_config(text: &str, config: Config) -> Self {
    let editor = MemoryEditor::new(text);
    let prompt = ScriptedPrompt::new();
    let app = App::new(config, prompt.clone()).with_editor(editor.clone());
    Self { app, editor, prompt }
  }

  pub fn run(&mut self, id: &str, args: &[Value]) -> CommandResult {
    self.app.execute(id, args)
  }

  /// Runs `id` and fails the test if it is rejected.
  #[track_caller]
  pub fn ok(&mut self, id: &str, args: &[Value]) -> &mut Self {
    if let Err(err) = self.app.execute(id, args) {
      panic!("{id} failed: {err}");
    }
    self
  }

  /// Runs `id` and returns the rejection message.
  #[track_caller]
  pub fn err(&mut self, id: &str, args: &[Value]) -> String {
    match self.app.execute(id, args) {
      Ok(()) => panic!("{id} was expected to fail"),
      Err(err) => err.message,
    }
  }

  pub fn type_text(&mut self, text: &str) -> &mut Self {
    self.ok("type", &[Value::String(text.to_string())])
  }

  pub fn find(&mut self, query: &str) -> &mut Self {
    self.ok("find", &[Value::String(query.to_string())])
  }

  pub fn text(&self) -> String {
    self.editor.contents()
  }

  pub fn cursor(&mut self, line: usize, col: usize) -> &mut Self {
    self.editor.set_selection(Selection::point((line, col).into()));
    self
  }

  /// Text under the selection, on a single line.
  pub fn selected(&self) -> String {
    let range = self.editor.selection().range();
    let line = self
      .editor
      .line_text(range.start.line)
      .unwrap_or_default();
    let end = if range.end.line == range.start.line {
      range.end.col
    } else {
      line.chars().count()
    };
    line
      .chars()
      .skip(range.start.col)
      .take(end.saturating_sub(range.start.col))
      .collect()
  }

  pub fn messages(&self) -> Vec<String> {
    self.app.messages().texts()
  }

  pub fn last_message(&self) -> Option<String> {
    self.app.messages().latest().map(|message| message.text)
  }

  /// Records the commands `script` runs as one book.
  pub fn record(&mut self, script: impl FnOnce(&mut Self)) -> &mut Self {
    self.ok("record.start", &[]);
    script(self);
    self.ok("record.end", &[])
  }
}
