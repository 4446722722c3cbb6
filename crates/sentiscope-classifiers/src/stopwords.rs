//! Stopword removal stage

use crate::stage::unexpected;
use regex::Regex;
use sentiscope_core::{Result, StageError, Value};
use std::collections::HashSet;

/// Tokenizes text and drops stopwords (case-insensitive)
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: HashSet<String>,
    word_pattern: Regex,
}

impl StopwordFilter {
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let word_pattern = Regex::new(r"\w+").map_err(|e| {
            sentiscope_core::Error::internal(format!("Failed to build word tokenizer: {e}"))
        })?;

        Ok(Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            word_pattern,
        })
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Split text into word tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.word_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn filter(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .filter(|t| !self.is_stopword(t))
            .cloned()
            .collect()
    }

    pub(crate) fn apply(&self, stage: &str, input: &Value) -> std::result::Result<Value, StageError> {
        match input {
            Value::Text(text) => Ok(Value::Tokens(self.filter(&self.tokenize(text)))),
            Value::Tokens(tokens) => Ok(Value::Tokens(self.filter(tokens))),
            other => Err(unexpected(stage, "text or tokens", other)),
        }
    }
}
