//! Text analysis: tokenization, stopword removal and stemming.
//!
//! The chain mirrors a classic English analyzer:
//! tokenize → lowercase → (possessive strip) → stopwords → stem.
//! Stopwords are removed before stemming, so the stop set is matched on surface forms.

use rust_stemmers::{Algorithm, Stemmer};
use std::fmt;

/// Classic English stop set (33 words).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Which analysis steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisParams {
    /// Apply the Snowball English stemmer (and strip possessives).
    pub stemming: bool,
    /// Drop [`ENGLISH_STOPWORDS`].
    pub stopwords: bool,
}

/// Turns text into index/query terms.
pub struct Analyzer {
    params: AnalysisParams,
    stemmer: Option<Stemmer>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("params", &self.params)
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer for the given steps.
    pub fn new(params: AnalysisParams) -> Self {
        let stemmer = params
            .stemming
            .then(|| Stemmer::create(Algorithm::English));
        Self { params, stemmer }
    }

    /// Analyze `text` into terms, in order (duplicates kept).
    pub fn analyze(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .filter_map(|token| {
                let mut token = token.to_lowercase();
                if self.params.stemming {
                    strip_possessive(&mut token);
                }
                let token = token.trim_matches('\'');
                if token.is_empty() {
                    return None;
                }
                if self.params.stopwords && ENGLISH_STOPWORDS.contains(&token) {
                    return None;
                }
                Some(match &self.stemmer {
                    Some(stemmer) => stemmer.stem(token).into_owned(),
                    None => token.to_string(),
                })
            })
            .collect()
    }
}

/// Split on anything that is neither alphanumeric nor an apostrophe.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
}

fn strip_possessive(token: &mut String) {
    if token.ends_with("'s") {
        token.truncate(token.len() - 2);
    }
}
