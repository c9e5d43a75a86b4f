//! Recorder and find settings.
//!
//! ```toml
//! [recorder]
//! max_recent = 3
//! reserved_prefix = "Recent recording"
//! command_timeout_ms = 5000
//!
//! [find]
//! max_contexts = 100
//! word_separators = "`~!@#$%^&*()-=+[{]}\\|;:'\",.<>/?"
//! ```

use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};
use the_core::chars::{
  DEFAULT_WORD_SEPARATORS,
  WordSeparators,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("invalid `{field}`: {reason}")]
  Invalid {
    field:  &'static str,
    reason: &'static str,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub recorder: RecorderConfig,
  pub find:     FindConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
  /// Ended recordings kept for replay, newest first.
  pub max_recent:         usize,
  /// Labels recent recordings in pickers. Named recordings may not use it.
  pub reserved_prefix:    String,
  pub command_timeout_ms: u64,
}

impl Default for RecorderConfig {
  fn default() -> Self {
    Self {
      max_recent:         3,
      reserved_prefix:    "Recent recording".to_string(),
      command_timeout_ms: 5_000,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FindConfig {
  pub max_contexts:    usize,
  pub word_separators: String,
}

impl Default for FindConfig {
  fn default() -> Self {
    Self {
      max_contexts:    the_find::session::DEFAULT_MAX_CONTEXTS,
      word_separators: DEFAULT_WORD_SEPARATORS.to_string(),
    }
  }
}

impl FindConfig {
  pub fn separators(&self) -> WordSeparators {
    WordSeparators::new(&self.word_separators)
  }
}

impl Config {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Config = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.recorder.max_recent == 0 {
      return Err(ConfigError::Invalid {
        field:  "recorder.max_recent",
        reason: "must keep at least one recording",
      });
    }
    if self.recorder.reserved_prefix.trim().is_empty() {
      return Err(ConfigError::Invalid {
        field:  "recorder.reserved_prefix",
        reason: "must not be blank",
      });
    }
    if self.find.max_contexts == 0 {
      return Err(ConfigError::Invalid {
        field:  "find.max_contexts",
        reason: "must keep at least one context",
      });
    }
    Ok(())
  }

  pub fn command_timeout(&self) -> Duration {
    Duration::from_millis(self.recorder.command_timeout_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_source_gives_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.recorder.max_recent, 3);
    assert_eq!(config.command_timeout(), Duration::from_secs(5));
    assert!(config.find.separators().is_separator('.'));
  }

  #[test]
  fn sections_override_independently() {
    let config = Config::from_toml(
      r#"
        [recorder]
        max_recent = 5

        [find]
        word_separators = "_"
      "#,
    )
    .unwrap();
    assert_eq!(config.recorder.max_recent, 5);
    assert_eq!(config.recorder.reserved_prefix, "Recent recording");
    assert_eq!(config.find.max_contexts, 100);
    assert!(config.find.separators().is_separator('_'));
    assert!(config.find.separators().is_word('.'));
  }

  #[test]
  fn rejects_unknown_keys_and_bad_values() {
    assert!(matches!(
      Config::from_toml("[recorder]\nmax_recnet = 2"),
      Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
      Config::from_toml("[recorder]\nmax_recent = 0"),
      Err(ConfigError::Invalid {
        field: "recorder.max_recent",
        ..
      })
    ));
  }
}
