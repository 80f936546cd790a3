//! Content moderation predicate applied to user-visible names.

use std::collections::HashSet;

pub trait ContentFilter: Send + Sync {
    fn is_allowed(&self, text: &str) -> bool;
}

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl ContentFilter for AllowAll {
    fn is_allowed(&self, _text: &str) -> bool {
        true
    }
}

/// Rejects text containing any blocked word, case-insensitively. Words are
/// matched on alphanumeric boundaries so "class" does not trip on "ass".
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    words: HashSet<String>,
}

impl BlockList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl ContentFilter for BlockList {
    fn is_allowed(&self, text: &str) -> bool {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .all(|token| !self.words.contains(token))
    }
}
