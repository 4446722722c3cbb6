//! Human-facing descriptions of preprocessing stages

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Title, definition and example shown for a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,

    #[serde(default)]
    pub definition: String,

    #[serde(default)]
    pub example: String,
}

impl CatalogEntry {
    pub fn new(
        title: impl Into<String>,
        definition: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            definition: definition.into(),
            example: example.into(),
        }
    }
}

/// Built-in entries keyed by lowercase stage name
const BUILTIN: &[(&str, &str, &str, &str)] = &[
    (
        "regex",
        "Regular Expressions (Regex)",
        "Pattern-based rewrites that detect or replace tokens such as negations, numbers, dates, punctuation and URLs.",
        "Negations like \"no\", \"not\", \"never\" are captured; digits are masked; links become a <URL> token.",
    ),
    (
        "stopwords",
        "Stop Words Removal",
        "Removes frequent words that carry little sentiment on their own.",
        "Words such as \"the\", \"and\", \"is\" are dropped so informative tokens remain.",
    ),
    (
        "stemming",
        "Stemming / Lemmatization",
        "Reduces words to a root form so related words count as the same feature.",
        "\"running\", \"runs\" -> \"run\".",
    ),
    (
        "vectorizer",
        "Vectorization (TF-IDF)",
        "Turns tokens into numeric features; TF-IDF weighs each token by how informative it is across documents.",
        "\"great\" gets a high weight when it is frequent in this review and rare across the corpus.",
    ),
];

/// Lookup table from stage name to its description.
///
/// Keys are matched case-insensitively. Unknown names have no entry; callers
/// fall back to the stage kind via [`StageCatalog::describe`].
#[derive(Debug, Clone)]
pub struct StageCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl StageCatalog {
    /// Catalog without any entries
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace an entry
    pub fn with_entry(mut self, name: &str, entry: CatalogEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: &str, entry: CatalogEntry) {
        self.entries.insert(name.to_lowercase(), entry);
    }

    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(&name.to_lowercase())
    }

    /// Entry for `name`, or the stage kind as title with empty text
    pub fn describe(&self, name: &str, kind: &str) -> CatalogEntry {
        self.lookup(name)
            .cloned()
            .unwrap_or_else(|| CatalogEntry::new(kind, "", ""))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for (name, title, definition, example) in BUILTIN {
            catalog.insert(name, CatalogEntry::new(*title, *definition, *example));
        }
        catalog
    }
}
