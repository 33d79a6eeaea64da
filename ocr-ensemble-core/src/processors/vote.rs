//! Choosing one text for a group of overlapping OCR fragments.
//!
//! Each source in a group contributes one [`Candidate`]. The vote applies, in
//! order:
//!
//! 1. **Majority**: a text that at least two sources read verbatim. Competing
//!    majorities of the same size go to the larger summed confidence.
//! 2. **Vocabulary** (only when one is supplied): the text with the largest
//!    share of known words, numbers and dates.
//! 3. **Confidence**: the text of the single most confident source.
//! 4. **Longest**: when several sources tie on top confidence, the longest of
//!    their texts.
//!
//! Every comparison ends on the text itself, so the result never depends on
//! candidate order.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use crate::core::{EnsembleError, EnsembleResult};

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+([.,:])").unwrap_or_else(|e| panic!("Failed to compile regex pattern: {e}"))
});

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+[.,]?\d*$").unwrap_or_else(|e| panic!("Failed to compile regex pattern: {e}"))
});

static SHORT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{1,2}$")
        .unwrap_or_else(|e| panic!("Failed to compile regex pattern: {e}"))
});

/// One source's reading of a text fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The text the source read.
    pub text: String,
    /// The source's confidence in that text.
    pub confidence: f32,
}

impl Candidate {
    /// Creates a candidate.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Which rule decided a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRule {
    /// Two or more sources agreed verbatim.
    Majority,
    /// Best vocabulary score.
    Vocabulary,
    /// Single most confident source.
    Confidence,
    /// Longest text among equally confident sources.
    Longest,
}

/// The outcome of a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    /// The winning text.
    pub text: String,
    /// Confidence of the best source that read the winning text.
    pub confidence: f32,
    /// The rule that decided.
    pub rule: VoteRule,
}

/// Known words used to break votes that have no majority.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    /// Creates an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from words; single letters are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::new();
        for word in words {
            vocab.insert(word.as_ref());
        }
        vocab
    }

    /// Reads one word per line.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut vocab = Self::new();
        for line in reader.lines() {
            vocab.insert(&line?);
        }
        Ok(vocab)
    }

    /// Reads a word-per-line file.
    pub fn load(path: &Path) -> EnsembleResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            EnsembleError::config_error(format!(
                "Failed to read vocabulary {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_reader(std::io::BufReader::new(file))?)
    }

    /// Adds a word.
    pub fn insert(&mut self, word: &str) {
        let word = normalize_word(word);
        if word.chars().count() > 1 {
            self.words.insert(word);
        }
    }

    /// Returns true when the word is known, ignoring case and edge punctuation.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&normalize_word(word))
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when there are no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Fraction of the words in `text` that are known words, plain numbers or
    /// short dates.
    pub fn score(&self, text: &str) -> f32 {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return 0.0;
        }
        let hits = words
            .iter()
            .filter(|w| self.contains(w) || NUMBER.is_match(w) || SHORT_DATE.is_match(w))
            .count();
        hits as f32 / words.len() as f32
    }
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Removes whitespace before `.`, `,` and `:` and collapses runs of
/// whitespace to single spaces.
pub fn normalize_text(text: &str) -> String {
    let tightened = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
    tightened.split_whitespace().join(" ")
}

/// Picks the best text among candidates, or `None` when none has any text.
pub fn vote_text(candidates: &[Candidate], vocab: Option<&Vocabulary>) -> Option<Vote> {
    let candidates: Vec<Candidate> = candidates
        .iter()
        .filter_map(|c| {
            let text = normalize_text(&c.text);
            (!text.is_empty()).then(|| Candidate::new(text, c.confidence))
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    if let Some(vote) = majority(&candidates) {
        return Some(vote);
    }

    if let Some(vocab) = vocab.filter(|v| !v.is_empty())
        && let Some(vote) = by_vocabulary(&candidates, vocab)
    {
        return Some(vote);
    }

    let max_conf = candidates
        .iter()
        .map(|c| c.confidence)
        .fold(f32::NEG_INFINITY, f32::max);
    let top: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.confidence == max_conf)
        .collect();

    if let [only] = top.as_slice() {
        return Some(Vote {
            text: only.text.clone(),
            confidence: only.confidence,
            rule: VoteRule::Confidence,
        });
    }

    top.into_iter()
        .min_by(|a, b| longer_first(&a.text, &b.text))
        .map(|c| Vote {
            text: c.text.clone(),
            confidence: c.confidence,
            rule: VoteRule::Longest,
        })
}

fn majority(candidates: &[Candidate]) -> Option<Vote> {
    let counts = candidates.iter().map(|c| c.text.as_str()).counts();
    let top = counts.values().copied().max()?;
    if top < 2 {
        return None;
    }

    let summed = |text: &str| -> f32 {
        candidates
            .iter()
            .filter(|c| c.text == text)
            .map(|c| c.confidence)
            .sum()
    };

    let text = counts
        .iter()
        .filter(|&(_, &count)| count == top)
        .map(|(&text, _)| text)
        .min_by(|a, b| {
            summed(*b)
                .total_cmp(&summed(*a))
                .then_with(|| longer_first(a, b))
        })?;

    let confidence = candidates
        .iter()
        .filter(|c| c.text == text)
        .map(|c| c.confidence)
        .fold(0.0, f32::max);

    Some(Vote {
        text: text.to_string(),
        confidence,
        rule: VoteRule::Majority,
    })
}

fn by_vocabulary(candidates: &[Candidate], vocab: &Vocabulary) -> Option<Vote> {
    candidates
        .iter()
        .map(|c| (vocab.score(&c.text), c))
        .filter(|(score, _)| *score > 0.0)
        .min_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| longer_first(&a.text, &b.text))
        })
        .map(|(_, c)| Vote {
            text: c.text.clone(),
            confidence: c.confidence,
            rule: VoteRule::Vocabulary,
        })
}

/// Orders longer texts first, then alphabetically.
fn longer_first(a: &str, b: &str) -> Ordering {
    b.chars()
        .count()
        .cmp(&a.chars().count())
        .then_with(|| a.cmp(b))
}
