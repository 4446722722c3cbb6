//! TF-IDF vectorizer over a fixed, already-fitted vocabulary

use crate::stage::unexpected;
use regex::Regex;
use sentiscope_core::{FeatureVector, Result, SparseVector, StageError, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default token pattern: words of two or more characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Row normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    None,
    #[default]
    L2,
}

/// Maps tokens to a sparse TF-IDF vector.
///
/// The vocabulary (and thus `dim`) is fixed at construction and never
/// changes per request.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    feature_names: Vec<String>,
    index: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    norm: Norm,
    sublinear_tf: bool,
    lowercase: bool,
    ngram_range: (usize, usize),
    token_pattern: Regex,
}

impl TfidfVectorizer {
    /// Create a count vectorizer over `vocabulary` (no idf, no normalization)
    pub fn new(vocabulary: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(vocabulary.len());
        for (i, term) in vocabulary.iter().enumerate() {
            if index.insert(term.clone(), i).is_some() {
                return Err(sentiscope_core::Error::config(format!(
                    "Duplicate vocabulary term '{}'",
                    term
                )));
            }
        }

        let token_pattern = Regex::new(DEFAULT_TOKEN_PATTERN).map_err(|e| {
            sentiscope_core::Error::internal(format!("Failed to build token pattern: {e}"))
        })?;

        Ok(Self {
            feature_names: vocabulary,
            index,
            idf: None,
            norm: Norm::None,
            sublinear_tf: false,
            lowercase: true,
            ngram_range: (1, 1),
            token_pattern,
        })
    }

    /// Set per-term inverse document frequencies
    pub fn with_idf(mut self, idf: Vec<f64>) -> Result<Self> {
        if idf.len() != self.feature_names.len() {
            return Err(sentiscope_core::Error::config(format!(
                "idf has {} entries but vocabulary has {}",
                idf.len(),
                self.feature_names.len()
            )));
        }
        if idf.iter().any(|v| !v.is_finite()) {
            return Err(sentiscope_core::Error::config("idf contains non-finite values"));
        }
        self.idf = Some(idf);
        Ok(self)
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn sublinear_tf(mut self, enabled: bool) -> Self {
        self.sublinear_tf = enabled;
        self
    }

    pub fn lowercase(mut self, enabled: bool) -> Self {
        self.lowercase = enabled;
        self
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 || min_n > max_n {
            return Err(sentiscope_core::Error::config(format!(
                "Invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }
        self.ngram_range = (min_n, max_n);
        Ok(self)
    }

    pub fn with_token_pattern(mut self, pattern: &str) -> Result<Self> {
        self.token_pattern = Regex::new(pattern).map_err(|e| {
            sentiscope_core::Error::config(format!("Invalid token pattern '{}': {}", pattern, e))
        })?;
        Ok(self)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn dim(&self) -> usize {
        self.feature_names.len()
    }

    /// Vectorize raw text with the configured token pattern
    pub fn transform_text(&self, text: &str) -> SparseVector {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<String> = self
            .token_pattern
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect();
        self.vectorize(&tokens)
    }

    /// Vectorize already tokenized input
    pub fn transform_tokens(&self, tokens: &[String]) -> SparseVector {
        if self.lowercase {
            let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
            self.vectorize(&lowered)
        } else {
            self.vectorize(tokens)
        }
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        let (min_n, max_n) = self.ngram_range;

        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&i) = self.index.get(&term) {
                    *counts.entry(i).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(i, count)| {
                let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
                let idf = self.idf.as_ref().map_or(1.0, |idf| idf[i]);
                (i, tf * idf)
            })
            .collect();

        if self.norm == Norm::L2 {
            let norm = weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in &mut weighted {
                    *v /= norm;
                }
            }
        }

        SparseVector::from_pairs(self.dim(), weighted)
    }

    pub(crate) fn apply(&self, stage: &str, input: &Value) -> std::result::Result<Value, StageError> {
        let vector = match input {
            Value::Text(text) => self.transform_text(text),
            Value::Tokens(tokens) => self.transform_tokens(tokens),
            other => return Err(unexpected(stage, "text or tokens", other)),
        };
        Ok(Value::Vector(FeatureVector::Sparse(vector)))
    }
}
