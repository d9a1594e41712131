// ABOUTME: Keyword sentiment classifier for review text.
// ABOUTME: Counts positive and negative keyword occurrences and labels the text by the larger count.

//! playreviews-sentiment - a small keyword-counting classifier.
//!
//! Text is lowercased and scanned once for every keyword occurrence. Keywords
//! match as substrings, so "bugs" counts toward "bug". Equal counts, including
//! zero against zero, are [`Sentiment::Neutral`].

use std::fmt;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use serde::Serialize;

pub const POSITIVE_WORDS: &[&str] = &["good", "great", "amazing", "excellent", "love", "fast"];
pub const NEGATIVE_WORDS: &[&str] = &["bad", "slow", "hate", "worst", "bug", "issue"];

static DEFAULT_CLASSIFIER: Lazy<Classifier> =
    Lazy::new(|| Classifier::new(POSITIVE_WORDS, NEGATIVE_WORDS));

/// Sentiment label for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        };
        write!(f, "{}", s)
    }
}

/// Keyword hit counts behind a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub positive: usize,
    pub negative: usize,
}

impl Score {
    pub fn sentiment(&self) -> Sentiment {
        match self.positive.cmp(&self.negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

/// Classifier over a positive and a negative keyword list.
pub struct Classifier {
    matcher: Option<AhoCorasick>,
    positive_len: usize,
}

impl Classifier {
    /// Keywords are matched case-insensitively after lowercasing.
    pub fn new(positive: &[&str], negative: &[&str]) -> Self {
        let patterns: Vec<String> = positive
            .iter()
            .chain(negative.iter())
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let positive_len = positive.iter().filter(|w| !w.is_empty()).count();
        // a build failure only leaves the classifier returning Neutral
        let matcher = AhoCorasick::new(&patterns).ok();
        Self {
            matcher,
            positive_len,
        }
    }

    pub fn score(&self, text: &str) -> Score {
        let mut score = Score::default();
        let Some(matcher) = &self.matcher else {
            return score;
        };
        let lowered = text.to_lowercase();
        for m in matcher.find_overlapping_iter(&lowered) {
            if m.pattern().as_usize() < self.positive_len {
                score.positive += 1;
            } else {
                score.negative += 1;
            }
        }
        score
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        self.score(text).sentiment()
    }
}

/// Classify with the built-in keyword lists.
pub fn classify(text: &str) -> Sentiment {
    DEFAULT_CLASSIFIER.classify(text)
}

/// Keyword counts with the built-in keyword lists.
pub fn score(text: &str) -> Score {
    DEFAULT_CLASSIFIER.score(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_reference_sentences() {
        assert_eq!(classify("This app is great and fast"), Sentiment::Positive);
        assert_eq!(classify("This app is slow and has a bug"), Sentiment::Negative);
        assert_eq!(classify("This app is ok"), Sentiment::Neutral);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(classify("EXCELLENT work, I LOVE it"), Sentiment::Positive);
    }

    #[test]
    fn repeated_words_are_counted() {
        let s = score("bad bad bad but good");
        assert_eq!(s, Score { positive: 1, negative: 3 });
        assert_eq!(s.sentiment(), Sentiment::Negative);
    }

    #[test]
    fn ties_are_neutral() {
        assert_eq!(classify("good but slow"), Sentiment::Neutral);
        assert_eq!(classify(""), Sentiment::Neutral);
    }

    #[test]
    fn keywords_match_inside_words() {
        assert_eq!(score("so many bugs and issues"), Score { positive: 0, negative: 2 });
    }

    #[test]
    fn custom_lists() {
        let c = Classifier::new(&["Smooth"], &["laggy"]);
        assert_eq!(c.classify("smooth scrolling"), Sentiment::Positive);
        assert_eq!(c.classify("a bit laggy"), Sentiment::Negative);
        assert_eq!(c.classify("great"), Sentiment::Neutral);
    }

    #[test]
    fn display_and_serialize() {
        assert_eq!(Sentiment::Negative.to_string(), "Negative");
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), "\"Positive\"");
    }
}
