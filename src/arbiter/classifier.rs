//! Keyword classification of spoken replies
//!
//! Pure text classification: an utterance either approves, denies, or says
//! nothing usable. Matching is case-insensitive and whole-word (multi-word
//! keywords must appear as a contiguous phrase). The keyword sets are data;
//! deployments swap languages by pointing the config at a JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Classification of a single utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The reply approves the pending action
    Approve,
    /// The reply denies the pending action
    Deny,
    /// Neither keyword set matched; keep waiting
    Unclassified,
}

/// Errors loading a keyword file
#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    #[error("failed to read keyword file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse keyword file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Approve and deny keyword sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSets {
    pub approve: Vec<String>,
    pub deny: Vec<String>,
}

impl Default for KeywordSets {
    /// Built-in English and Polish keywords.
    fn default() -> Self {
        Self {
            approve: to_strings(&[
                "tak",
                "yes",
                "yeah",
                "yep",
                "sure",
                "ok",
                "okay",
                "go ahead",
                "do it",
                "proceed",
                "zatwierdź",
                "zrób to",
                "dawaj",
                "jasne",
                "oczywiście",
                "pewnie",
                "dobra",
                "spoko",
                "approve",
                "approved",
                "confirm",
                "confirmed",
                "accept",
            ]),
            deny: to_strings(&[
                "nie",
                "no",
                "nope",
                "don't",
                "stop",
                "cancel",
                "abort",
                "nie rób",
                "anuluj",
                "przerwij",
                "odmów",
                "odrzuć",
                "deny",
                "denied",
                "reject",
                "rejected",
                "refuse",
            ]),
        }
    }
}

impl KeywordSets {
    /// Load keyword sets from a JSON file:
    /// `{"approve": ["yes", ...], "deny": ["no", ...]}`
    pub fn load(path: &Path) -> Result<Self, KeywordError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Classifies utterances against a pair of keyword sets.
pub struct Classifier {
    approve: Vec<Vec<String>>,
    deny: Vec<Vec<String>>,
}

impl Classifier {
    /// Build a classifier from keyword sets. Keywords are tokenized once
    /// here; empty keywords are dropped.
    pub fn new(sets: KeywordSets) -> Self {
        Self {
            approve: tokenize_keywords(&sets.approve),
            deny: tokenize_keywords(&sets.deny),
        }
    }

    /// Classify one utterance.
    ///
    /// The approve set is checked first, so an utterance containing keywords
    /// from both sets classifies as Approve.
    pub fn classify(&self, text: &str) -> Verdict {
        let words = tokenize(text);

        if matches_any(&words, &self.approve) {
            Verdict::Approve
        } else if matches_any(&words, &self.deny) {
            Verdict::Deny
        } else {
            Verdict::Unclassified
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(KeywordSets::default())
    }
}

/// Lowercase and split on non-word characters. Apostrophes stay inside
/// words so contractions like "don't" survive as one token.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_string())
        .collect()
}

fn tokenize_keywords(keywords: &[String]) -> Vec<Vec<String>> {
    keywords
        .iter()
        .map(|keyword| tokenize(keyword))
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

fn matches_any(words: &[String], phrases: &[Vec<String>]) -> bool {
    phrases.iter().any(|phrase| contains_phrase(words, phrase))
}

fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > words.len() {
        return false;
    }
    words
        .windows(phrase.len())
        .any(|window| window == phrase)
}
