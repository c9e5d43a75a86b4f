//! Match engine.
//!
//! A [`Document`] is an immutable snapshot of editor text plus its line index.
//! It is rebuilt from the live editor on every refresh; nothing is cached
//! across edits.
//!
//! # Matching rules
//!
//! - An empty query matches nothing.
//! - Literal queries are escaped and match verbatim, including an embedded
//!   `\n`, so a literal may span lines.
//! - Regex queries are used as written. `.` does not cross a line break and
//!   `^`/`$` anchor at line boundaries; an explicit `\n` does cross lines.
//! - Case-insensitive search changes the comparison only. Offsets always refer
//!   to the stored text.
//! - Whole-word filtering uses the configured [`WordSeparators`], not `\b`.

use regex::{
  Regex,
  RegexBuilder,
};
use the_core::{
  LineIndex,
  Position,
  Range,
  chars::WordSeparators,
};
use thiserror::Error;

/// Invalid pattern. Carries the parser's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MatchError {
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchQuery {
  pub text:             String,
  pub case_insensitive: bool,
  pub regex:            bool,
  pub whole_word:       bool,
}

impl MatchQuery {
  pub fn literal(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      ..Self::default()
    }
  }

  pub fn regex(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      regex: true,
      ..Self::default()
    }
  }

  pub fn case_insensitive(mut self, on: bool) -> Self {
    self.case_insensitive = on;
    self
  }

  pub fn whole_word(mut self, on: bool) -> Self {
    self.whole_word = on;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
  pub range: Range,
  /// Matched text as it appears in the document.
  pub text:  String,
  /// Position of this match in its set.
  pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
  /// Sorted, non-overlapping.
  pub matches:     Vec<Match>,
  /// Whole words that were rejected only because they run on past the query.
  /// Sorted and deduplicated.
  pub suggestions: Vec<String>,
}

/// Compiles `query` into the regex the engine scans with.
pub fn build_regex(query: &MatchQuery) -> Result<Regex, MatchError> {
  let pattern = if query.regex {
    query.text.clone()
  } else {
    regex::escape(&query.text)
  };
  RegexBuilder::new(&pattern)
    .case_insensitive(query.case_insensitive)
    .multi_line(true)
    .build()
    .map_err(|err| {
      MatchError {
        message: err.to_string(),
      }
    })
}

/// Text to put in place of `matched` when replacing. Regex replacements
/// expand capture references such as `$1` or `${name}`; literal replacements
/// are used as is.
pub fn replacement_for(regex: &Regex, matched: &str, replacement: &str, is_regex: bool) -> String {
  if !is_regex {
    return replacement.to_string();
  }
  match regex.captures(matched) {
    Some(caps) => {
      let mut out = String::new();
      caps.expand(replacement, &mut out);
      out
    },
    None => replacement.to_string(),
  }
}

#[derive(Debug, Clone)]
pub struct Document {
  text:  String,
  index: LineIndex,
}

impl Document {
  pub fn new(text: impl Into<String>) -> Self {
    let text = text.into();
    let index = LineIndex::new(&text);
    Self { text, index }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn line_index(&self) -> &LineIndex {
    &self.index
  }

  pub fn position(&self, offset: usize) -> Position {
    self.index.position(&self.text, offset)
  }

  pub fn offset(&self, pos: Position) -> Option<usize> {
    self.index.offset(&self.text, pos)
  }

  pub fn matches(
    &self,
    query: &MatchQuery,
    separators: &WordSeparators,
  ) -> Result<MatchSet, MatchError> {
    if query.text.is_empty() {
      return Ok(MatchSet::default());
    }

    let regex = build_regex(query)?;
    let mut suggestions = Vec::new();
    let mut matches = Vec::new();
    for found in regex.find_iter(&self.text) {
      let (start, end) = (found.start(), found.end());
      if query.whole_word {
        match self.word_boundary(start, end, separators) {
          Boundary::Whole => {},
          Boundary::Left => continue,
          Boundary::Right { word_end } => {
            suggestions.push(self.text[start..word_end].to_string());
            continue;
          },
        }
      }
      matches.push(Match {
        range: Range::new(self.position(start), self.position(end)),
        text:  found.as_str().to_string(),
        index: matches.len(),
      });
    }

    suggestions.sort();
    suggestions.dedup();
    tracing::trace!(
      query = %query.text,
      matches = matches.len(),
      suggestions = suggestions.len(),
      "computed matches"
    );
    Ok(MatchSet {
      matches,
      suggestions,
    })
  }

  fn word_boundary(&self, start: usize, end: usize, separators: &WordSeparators) -> Boundary {
    let found = &self.text[start..end];

    let starts_in_word = found.chars().next().is_some_and(|ch| separators.is_word(ch));
    if starts_in_word {
      let before = self.text[..start].chars().next_back();
      if before.is_some_and(|ch| separators.is_word(ch)) {
        return Boundary::Left;
      }
    }

    let ends_in_word = found.chars().next_back().is_some_and(|ch| separators.is_word(ch));
    if ends_in_word {
      let after = self.text[end..].chars().next();
      if after.is_some_and(|ch| separators.is_word(ch)) {
        return Boundary::Right {
          word_end: end + separators.word_run_len(&self.text, end),
        };
      }
    }

    Boundary::Whole
  }
}

enum Boundary {
  Whole,
  /// Preceded by a word char.
  Left,
  /// Followed by a word char; the word continues to `word_end`.
  Right { word_end: usize },
}

#[cfg(test)]
mod test {
  use quickcheck::{
    TestResult,
    quickcheck,
  };

  use super::*;

  fn ranges(doc: &Document, query: &MatchQuery) -> Vec<Range> {
    doc
      .matches(query, &WordSeparators::default())
      .unwrap()
      .matches
      .into_iter()
      .map(|m| m.range)
      .collect()
  }

  #[test]
  fn empty_query_matches_nothing() {
    let doc = Document::new("abc");
    assert_eq!(ranges(&doc, &MatchQuery::literal("")), vec![]);
    assert_eq!(ranges(&doc, &MatchQuery::regex("")), vec![]);
  }

  #[test]
  fn literal_single_match() {
    let doc = Document::new("one two three");
    assert_eq!(
      ranges(&doc, &MatchQuery::literal("two")),
      vec![((0, 4), (0, 7)).into()]
    );
  }

  #[test]
  fn literal_scan_does_not_overlap() {
    let doc = Document::new(" abc abc abc abc abc ");
    assert_eq!(
      ranges(&doc, &MatchQuery::literal(" abc abc ")),
      vec![((0, 0), (0, 9)).into(), ((0, 12), (0, 21)).into()]
    );
  }

  #[test]
  fn literal_escapes_regex_syntax() {
    let doc = Document::new("a.c abc (x)");
    assert_eq!(
      ranges(&doc, &MatchQuery::literal("a.c")),
      vec![((0, 0), (0, 3)).into()]
    );
    assert_eq!(
      ranges(&doc, &MatchQuery::literal("(x)")),
      vec![((0, 8), (0, 11)).into()]
    );
  }

  #[test]
  fn case_sensitivity() {
    let doc = Document::new("one two THREE four");
    assert_eq!(
      ranges(&doc, &MatchQuery::literal("e ")),
      vec![((0, 2), (0, 4)).into()]
    );

    let set = doc
      .matches(
        &MatchQuery::literal("e ").case_insensitive(true),
        &WordSeparators::default(),
      )
      .unwrap();
    let texts: Vec<_> = set.matches.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["e ", "E "]);
    assert_eq!(set.matches[1].range, ((0, 12), (0, 14)).into());
  }

  #[test]
  fn whole_word_filters_and_suggests() {
    let doc = Document::new("abcd\nbcde\nbcd");
    let set = doc
      .matches(
        &MatchQuery::literal("bcd").whole_word(true),
        &WordSeparators::default(),
      )
      .unwrap();
    assert_eq!(set.matches.len(), 1);
    assert_eq!(set.matches[0].range, ((2, 0), (2, 3)).into());
    assert_eq!(set.matches[0].index, 0);
    // "abcd" is rejected on its left edge, which offers nothing.
    assert_eq!(set.suggestions, vec!["bcde".to_string()]);
  }

  #[test]
  fn whole_word_respects_configured_separators() {
    let doc = Document::new("foo-bar foo_bar");
    let dash_splits = doc
      .matches(
        &MatchQuery::literal("foo").whole_word(true),
        &WordSeparators::default(),
      )
      .unwrap();
    assert_eq!(dash_splits.matches.len(), 1);
    assert_eq!(dash_splits.suggestions, vec!["foo_bar".to_string()]);

    let underscore_splits = doc
      .matches(
        &MatchQuery::literal("foo").whole_word(true),
        &WordSeparators::new("_"),
      )
      .unwrap();
    assert_eq!(underscore_splits.matches.len(), 1);
    assert_eq!(underscore_splits.matches[0].range, ((0, 8), (0, 11)).into());
  }

  #[test]
  fn regex_dot_stays_on_its_line() {
    let doc = Document::new("one\ntwo\nthree\ntwo\none");
    assert_eq!(
      ranges(&doc, &MatchQuery::regex("o.*")),
      vec![
        ((0, 0), (0, 3)).into(),
        ((1, 2), (1, 3)).into(),
        ((3, 2), (3, 3)).into(),
        ((4, 0), (4, 3)).into(),
      ]
    );
  }

  #[test]
  fn explicit_newline_spans_lines() {
    let doc = Document::new("one\ntwo\nthree\ntwo\none");
    assert_eq!(
      ranges(&doc, &MatchQuery::regex("two\\nthree")),
      vec![((1, 0), (2, 5)).into()]
    );
    assert_eq!(
      ranges(&doc, &MatchQuery::literal("o\nth")),
      vec![((1, 2), (2, 2)).into()]
    );
  }

  #[test]
  fn regex_anchors_are_per_line() {
    let doc = Document::new("ab\nab");
    assert_eq!(
      ranges(&doc, &MatchQuery::regex("^a")),
      vec![((0, 0), (0, 1)).into(), ((1, 0), (1, 1)).into()]
    );
  }

  #[test]
  fn invalid_regex_reports_parser_message() {
    let doc = Document::new("abc");
    let err = doc
      .matches(&MatchQuery::regex("(abc"), &WordSeparators::default())
      .unwrap_err();
    assert!(!err.message.is_empty());
    assert!(err.message.contains("unclosed"), "{}", err.message);
  }

  #[test]
  fn regex_replacement_expands_groups() {
    let query = MatchQuery::regex("(\\w+)@(\\w+)");
    let regex = build_regex(&query).unwrap();
    assert_eq!(replacement_for(&regex, "me@host", "$2 at $1", true), "host at me");
    assert_eq!(replacement_for(&regex, "me@host", "$2 at $1", false), "$2 at $1");
  }

  quickcheck! {
    fn literal_matches_agree_with_match_indices(text: String, query: String) -> TestResult {
      if query.is_empty() {
        return TestResult::discard();
      }
      let doc = Document::new(text.clone());
      let got: Vec<Position> = doc
        .matches(&MatchQuery::literal(query.clone()), &WordSeparators::default())
        .unwrap()
        .matches
        .into_iter()
        .map(|m| m.range.start)
        .collect();
      let want: Vec<Position> = text
        .match_indices(query.as_str())
        .map(|(idx, _)| doc.position(idx))
        .collect();
      TestResult::from_bool(got == want)
    }
  }
}
