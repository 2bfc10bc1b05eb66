//! Lexicon module
//!
//! In-memory form of the gazetteer and the type vocabulary. A lexicon is
//! built once at startup and only read afterwards, so request handlers
//! share it by reference without locking.

use std::collections::HashSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use locner_core::{LexiconConfig, NerError, Result, Span};

/// Options controlling how lexicon entries match text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Ignore case when comparing entries against text
    pub case_insensitive: bool,
    /// Require non-alphanumeric characters (or text edges) around a match
    pub whole_word: bool,
}

impl From<&LexiconConfig> for MatchOptions {
    fn from(config: &LexiconConfig) -> Self {
        Self {
            case_insensitive: config.case_insensitive,
            whole_word: config.whole_word,
        }
    }
}

/// How a single entry is searched for
#[derive(Debug, Clone)]
enum Matcher {
    /// Byte-exact substring search
    Literal(String),
    /// Escaped literal compiled case-insensitively, so offsets stay valid
    /// for the original text even when case folding changes byte lengths
    Folded(Regex),
}

impl Matcher {
    /// First occurrence starting at or after byte `pos`
    fn find_at(&self, text: &str, pos: usize) -> Option<Span> {
        match self {
            Self::Literal(entry) => text[pos..]
                .find(entry.as_str())
                .map(|i| Span::new(pos + i, pos + i + entry.len())),
            Self::Folded(regex) => regex
                .find_at(text, pos)
                .map(|m| Span::new(m.start(), m.end())),
        }
    }

    /// Non-overlapping occurrences, scanning left to right.
    ///
    /// An occurrence rejected by the word-boundary check does not consume
    /// its text; the scan resumes one character past its start.
    fn spans(&self, text: &str, whole_word: bool) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while let Some(span) = self.find_at(text, pos) {
            if !whole_word || is_word_bounded(text, span) {
                spans.push(span);
                pos = span.end;
            } else {
                pos = span.start + text[span.start..].chars().next().map_or(1, char::len_utf8);
            }
        }

        spans
    }
}

/// Immutable set of entries searched as literal substrings
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<String>,
    matchers: Vec<Matcher>,
    options: MatchOptions,
}

impl Lexicon {
    /// Build a lexicon from in-memory entries.
    ///
    /// Entries are trimmed, blank entries are skipped and duplicates are
    /// collapsed (case-insensitively when the options ask for it).
    pub fn from_entries<I, S>(entries: I, options: MatchOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        let mut matchers = Vec::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }

            let key = if options.case_insensitive {
                entry.to_lowercase()
            } else {
                entry.to_string()
            };
            if !seen.insert(key) {
                continue;
            }

            let matcher = if options.case_insensitive {
                let regex = RegexBuilder::new(&regex::escape(entry))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| NerError::Other(e.into()))?;
                Matcher::Folded(regex)
            } else {
                Matcher::Literal(entry.to_string())
            };

            kept.push(entry.to_string());
            matchers.push(matcher);
        }

        Ok(Self {
            entries: kept,
            matchers,
            options,
        })
    }

    /// Load a lexicon file.
    ///
    /// `.json` files must hold an array of strings; anything else is read
    /// as one entry per line with `#` comment lines. A file that yields no
    /// entries is rejected.
    pub fn load(path: impl AsRef<Path>, options: MatchOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| NerError::LexiconLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let raw: Vec<String> = if is_json {
            serde_json::from_str(&content).map_err(|e| NerError::LexiconParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#'))
                .map(str::to_string)
                .collect()
        };

        let lexicon = Self::from_entries(raw, options)?;
        if lexicon.is_empty() {
            return Err(NerError::EmptyLexicon(path.to_path_buf()));
        }

        tracing::info!(
            path = %path.display(),
            entries = lexicon.len(),
            "Loaded lexicon"
        );
        Ok(lexicon)
    }

    /// Every occurrence of every entry in `text`.
    ///
    /// Occurrences of one entry never overlap each other; occurrences of
    /// different entries may, and are left for the reconciler to resolve.
    pub fn find(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        if text.is_empty() {
            return spans;
        }

        for matcher in &self.matchers {
            spans.extend(matcher.spans(text, self.options.whole_word));
        }

        spans
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_word_bounded(text: &str, span: Span) -> bool {
    let before = text[..span.start].chars().next_back();
    let after = text[span.end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

// ============================================================================
// Tests
// ============================================================================
