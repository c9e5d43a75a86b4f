//! Prompt surfaces the host provides.
//!
//! Prompts are blocking from the caller's point of view: commands run on the
//! queue worker's blocking thread, so a host is free to park that thread until
//! the user answers.

use std::fmt;

pub type Validator = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Single-line text input.
pub struct InputRequest {
  pub title:       String,
  pub placeholder: Option<String>,
  /// Pre-filled value.
  pub value:       Option<String>,
  validate:        Option<Validator>,
}

impl InputRequest {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title:       title.into(),
      placeholder: None,
      value:       None,
      validate:    None,
    }
  }

  pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
    self.placeholder = Some(placeholder.into());
    self
  }

  pub fn value(mut self, value: impl Into<String>) -> Self {
    self.value = Some(value.into());
    self
  }

  /// `validate` returns the message to show for an unacceptable value.
  pub fn validate(mut self, validate: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
    self.validate = Some(Box::new(validate));
    self
  }

  pub fn check(&self, value: &str) -> Option<String> {
    self.validate.as_ref().and_then(|validate| validate(value))
  }
}

impl fmt::Debug for InputRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InputRequest")
      .field("title", &self.title)
      .field("placeholder", &self.placeholder)
      .field("value", &self.value)
      .field("validate", &self.validate.is_some())
      .finish()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickButton {
  Repeat,
  NTimes,
  Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
  pub label:   String,
  pub buttons: Vec<PickButton>,
}

impl PickItem {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label:   label.into(),
      buttons: Vec::new(),
    }
  }

  pub fn with_buttons(mut self, buttons: &[PickButton]) -> Self {
    self.buttons = buttons.to_vec();
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
  pub title: String,
  pub items: Vec<PickItem>,
  pub multi: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
  Selected(Vec<String>),
  Button { label: String, button: PickButton },
}

pub trait Prompt: Send {
  /// `None` when the user dismissed the input.
  fn input(&mut self, request: InputRequest) -> Option<String>;

  /// `None` when the user dismissed the list.
  fn pick(&mut self, request: PickRequest) -> Option<PickOutcome>;
}

/// Host without any prompt surface. Every prompt is dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
  fn input(&mut self, _request: InputRequest) -> Option<String> {
    None
  }

  fn pick(&mut self, _request: PickRequest) -> Option<PickOutcome> {
    None
  }
}
