//! Search terms and per-request matchers

use crate::cell::Cell;
use crate::error::{GridError, Result};
use crate::locale::Locale;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Search box contents: raw text plus the regex flag
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub regex: bool,
}

impl SearchSpec {
    pub fn new(value: impl Into<String>, regex: bool) -> Self {
        SearchSpec {
            value: value.into(),
            regex,
        }
    }

    /// Whitespace separated search terms
    pub fn terms(&self) -> Vec<String> {
        self.value.split_whitespace().map(str::to_string).collect()
    }

    /// True if the search box contains anything but whitespace
    pub fn has_search_text(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Prepare the terms for matching
    ///
    /// Regex terms are compiled once here and must match the whole cell text.
    ///
    /// # Errors
    /// * [`GridError::InvalidSearchPattern`] if a regex term does not compile
    pub fn compile(&self) -> Result<Matcher> {
        let terms = self.terms();
        if !self.regex {
            return Ok(Matcher::PlainText(terms));
        }

        let mut patterns = Vec::with_capacity(terms.len());
        for term in terms {
            let pattern = Regex::new(&format!("^(?:{})$", term)).map_err(|source| {
                GridError::InvalidSearchPattern {
                    pattern: term.clone(),
                    source,
                }
            })?;
            patterns.push(pattern);
        }
        Ok(Matcher::Regex(patterns))
    }
}

/// Compiled search terms
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Case-insensitive substring terms
    PlainText(Vec<String>),
    /// Full-match patterns
    Regex(Vec<Regex>),
}

impl Matcher {
    pub fn term_count(&self) -> usize {
        match self {
            Matcher::PlainText(terms) => terms.len(),
            Matcher::Regex(patterns) => patterns.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term_count() == 0
    }

    /// Record in `matches` which terms match the cell's plain text
    pub fn match_cell(&self, cell: &Cell, locale: &Locale, matches: &mut TermMatches) {
        match self {
            Matcher::PlainText(terms) => cell.match_plain_text_ignore_case(terms, locale, matches),
            Matcher::Regex(patterns) => cell.match_regex(patterns, matches),
        }
    }
}

/// Fixed-size bitset, one bit per search term
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermMatches {
    words: Vec<u64>,
    len: usize,
}

impl TermMatches {
    pub fn new(len: usize) -> Self {
        TermMatches {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn set(&mut self, index: usize) {
        if index < self.len {
            self.words[index / 64] |= 1 << (index % 64);
        }
    }

    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// True once every term has matched
    pub fn all_set(&self) -> bool {
        self.count() == self.len
    }
}
