//! Word classification.
//!
//! Whole-word search needs to know where a word ends. That boundary is not
//! `\b`: hosts let the user choose which punctuation separates words, so the
//! separator set is data, not a regex class.

/// Separator set used when nothing else is configured.
pub const DEFAULT_WORD_SEPARATORS: &str = "`~!@#$%^&*()-=+[{]}\\|;:'\",.<>/?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSeparators {
  // Sorted and deduplicated so lookups can binary search.
  chars: Vec<char>,
}

impl WordSeparators {
  pub fn new(separators: &str) -> Self {
    let mut chars: Vec<char> = separators.chars().collect();
    chars.sort_unstable();
    chars.dedup();
    Self { chars }
  }

  /// Whitespace always separates words, whatever the configured set says.
  #[inline]
  pub fn is_separator(&self, ch: char) -> bool {
    ch.is_whitespace() || self.chars.binary_search(&ch).is_ok()
  }

  #[inline]
  pub fn is_word(&self, ch: char) -> bool {
    !self.is_separator(ch)
  }

  /// Length in bytes of the run of word characters starting at `from`.
  pub fn word_run_len(&self, text: &str, from: usize) -> usize {
    text[from..]
      .char_indices()
      .find(|(_, ch)| self.is_separator(*ch))
      .map_or(text.len() - from, |(idx, _)| idx)
  }
}

impl Default for WordSeparators {
  fn default() -> Self {
    Self::new(DEFAULT_WORD_SEPARATORS)
  }
}
