//! Text statistics and word-frequency ranking.
//!
//! Two tokenizations are used on purpose:
//! - statistics split on whitespace, so `"fox."` and `"e-mail"` are one word each;
//! - frequency ranking scans lowercase word-character runs, so punctuation is
//!   dropped and `"e-mail"` contributes `"e"` and `"mail"`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::stop_words::StopWords;

/// Number of entries kept in a frequency list unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 20;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Text-level metrics for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
    pub char_count_without_spaces: usize,
    pub sentence_count: usize,
    /// Mean length of the whitespace-separated words; 0 when there are none.
    pub avg_word_length: f64,
}

/// One `(word, count)` entry of a frequency list. Serializes as `["word", n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount(pub String, pub usize);

impl WordCount {
    pub fn word(&self) -> &str {
        &self.0
    }

    pub fn count(&self) -> usize {
        self.1
    }
}

/// Statistics plus ranked word frequencies, in the response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub stats: TextStats,
    pub word_frequency: Vec<WordCount>,
}

/// Compute [`TextStats`] for `text`.
pub fn analyze_stats(text: &str) -> TextStats {
    let (word_count, total_word_chars) = text
        .split_whitespace()
        .fold((0usize, 0usize), |(n, chars), w| {
            (n + 1, chars + w.chars().count())
        });

    let char_count = text.chars().count();
    let char_count_without_spaces = text.chars().filter(|c| !c.is_whitespace()).count();

    let sentence_count = SENTENCE_SPLIT_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count();

    let avg_word_length = if word_count == 0 {
        0.0
    } else {
        total_word_chars as f64 / word_count as f64
    };

    TextStats {
        word_count,
        char_count,
        char_count_without_spaces,
        sentence_count,
        avg_word_length,
    }
}

/// Rank the [`DEFAULT_TOP_N`] most frequent words of `text`, skipping `stop_words`.
pub fn analyze_frequency(text: &str, stop_words: &StopWords) -> Vec<WordCount> {
    rank_words(text, stop_words, DEFAULT_TOP_N)
}

/// Count lowercase word-character tokens and return the `top_n` most frequent.
///
/// Sorting is by count, descending. Words with equal counts keep the order in
/// which they first appear in the text.
fn rank_words(text: &str, stop_words: &StopWords, top_n: usize) -> Vec<WordCount> {
    let lower = text.to_lowercase();

    // Insertion order doubles as the tie-break.
    let mut entries: Vec<WordCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for m in WORD_RE.find_iter(&lower) {
        let word = m.as_str();
        if stop_words.contains(word) {
            continue;
        }
        match positions.get(word) {
            Some(&idx) => entries[idx].1 += 1,
            None => {
                positions.insert(word, entries.len());
                entries.push(WordCount(word.to_string(), 1));
            }
        }
    }

    // `sort_by` is stable, so first-seen order survives among ties.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(top_n);
    entries
}

/// Analyzer configured with a stop-word set and a list length.
#[derive(Debug, Clone)]
pub struct Analyzer {
    stop_words: StopWords,
    top_n: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(StopWords::default(), DEFAULT_TOP_N)
    }
}

impl Analyzer {
    pub fn new(stop_words: StopWords, top_n: usize) -> Self {
        Self { stop_words, top_n }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn analyze_stats(&self, text: &str) -> TextStats {
        analyze_stats(text)
    }

    pub fn analyze_frequency(&self, text: &str) -> Vec<WordCount> {
        rank_words(text, &self.stop_words, self.top_n)
    }

    pub fn analyze(&self, text: &str) -> AnalysisReport {
        AnalysisReport {
            stats: self.analyze_stats(text),
            word_frequency: self.analyze_frequency(text),
        }
    }
}
