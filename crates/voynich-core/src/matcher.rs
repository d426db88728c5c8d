//! Longest-match lookup with a fixed tie-break.
//!
//! The grammar split goes through [`Matcher`] for both the operator and the
//! suffix table, and the classifiers read that split, so the ordering rule
//! lives in one place: longer patterns first, then lower priority
//! (declaration index) first.

use std::collections::HashSet;

use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<T> {
    pattern: String,
    value: T,
    priority: usize,
}

/// A pattern that matched, with the value it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a, T> {
    pub pattern: &'a str,
    pub value: &'a T,
    pub priority: usize,
}

/// Immutable pattern table searched longest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher<T> {
    /// Sorted by descending pattern length, then ascending priority.
    entries: Vec<Entry<T>>,
}

impl<T> Matcher<T> {
    /// Build a matcher; declaration order is the priority order.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is empty or declared twice.
    pub fn new<I>(table: &'static str, entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let mut seen = HashSet::new();
        let mut sorted = Vec::new();

        for (priority, (pattern, value)) in entries.into_iter().enumerate() {
            if pattern.is_empty() {
                return Err(TableError::EmptyPattern { table });
            }
            if !seen.insert(pattern.clone()) {
                return Err(TableError::DecompositionAmbiguous { table, pattern });
            }
            sorted.push(Entry {
                pattern,
                value,
                priority,
            });
        }

        sorted.sort_by(|a, b| {
            b.pattern
                .len()
                .cmp(&a.pattern.len())
                .then(a.priority.cmp(&b.priority))
        });

        Ok(Self { entries: sorted })
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup.
    pub fn get(&self, pattern: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.pattern == pattern)
            .map(|e| &e.value)
    }

    /// All patterns `text` starts with, best match first.
    pub fn prefixes_of<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = Match<'a, T>> + 'a {
        self.entries
            .iter()
            .filter(move |e| text.starts_with(e.pattern.as_str()))
            .map(Entry::as_match)
    }

    /// All patterns `text` ends with, best match first.
    pub fn suffixes_of<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = Match<'a, T>> + 'a {
        self.entries
            .iter()
            .filter(move |e| text.ends_with(e.pattern.as_str()))
            .map(Entry::as_match)
    }
}

impl<T> Entry<T> {
    fn as_match(&self) -> Match<'_, T> {
        Match {
            pattern: &self.pattern,
            value: &self.value,
            priority: self.priority,
        }
    }
}
