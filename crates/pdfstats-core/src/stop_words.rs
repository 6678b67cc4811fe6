use std::collections::HashSet;

/// Words excluded from frequency ranking unless configuration says otherwise.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "so", "as", "of", "in", "on", "at", "to",
    "for", "from", "by", "with", "about", "into", "over", "is", "are", "was", "were", "be", "been",
    "being", "am", "has", "have", "had", "do", "does", "did", "it", "its", "this", "that", "these",
    "those", "i", "you", "he", "she", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "our", "their", "not", "no", "can", "will", "would", "should", "could", "there", "which",
    "who", "what", "when", "where", "how", "all", "any", "also", "than",
];

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Build an override from an optional replacement list and optional
    /// additions. Additions given alongside a replacement are appended to it.
    pub fn from_parts(replace: Option<Vec<T>>, extend: Option<Vec<T>>) -> Self {
        match (replace, extend) {
            (None, None) => ListOverride::Default,
            (Some(r), None) => ListOverride::Replace(r),
            (None, Some(e)) => ListOverride::Extend(e),
            (Some(mut r), Some(e)) => {
                r.extend(e);
                ListOverride::Replace(r)
            }
        }
    }

    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// A set of lowercase words to leave out of frequency counts.
///
/// Entries are trimmed and lowercased on the way in, matching the
/// lowercased tokens the analyzer produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// An empty set: every token is counted.
    pub fn none() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Build from the defaults with an override applied.
    pub fn from_override(list: &ListOverride<String>) -> Self {
        let defaults: Vec<String> = DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect();
        Self::new(list.resolve(&defaults))
    }

    /// Apply an override on top of this set rather than the built-in list.
    pub fn apply(&mut self, list: &ListOverride<String>) {
        match list {
            ListOverride::Default => {}
            ListOverride::Replace(words) => *self = Self::new(words),
            ListOverride::Extend(words) => self.extend(words),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}
