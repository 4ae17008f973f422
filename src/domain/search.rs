use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::dataset::Row;

/// The keys a user asked for, normalised once.
///
/// Each key is trimmed; blank entries are dropped. Keys are compared
/// case-insensitively, so `"A1"`, `" a1"` and `"A1 "` are one logical key.
/// The first spelling seen is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// normalised key → display spelling
    keys: BTreeMap<String, String>,
}

impl SearchRequest {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = BTreeMap::new();
        for key in raw {
            let trimmed = key.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            keys.entry(normalize_key(trimmed))
                .or_insert_with(|| trimmed.to_string());
        }
        Self { keys }
    }

    /// Split a comma-separated key list (`"A1, A3,Z9"`).
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.keys.contains_key(normalized)
    }

    /// Normalised keys in sorted order.
    pub fn normalized_keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn display(&self, normalized: &str) -> Option<&str> {
        self.keys.get(normalized).map(String::as_str)
    }
}

/// Comparison form of a key or cell: trimmed and lower-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Outcome of a search: matched rows plus the keys nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    /// Matching rows in source order. Duplicate rows in the data are kept.
    pub matched: Vec<Row>,
    /// Requested keys (display spelling) with no matching row, sorted.
    pub not_found: BTreeSet<String>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.not_found.is_empty()
    }
}
