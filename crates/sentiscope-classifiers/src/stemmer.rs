//! Light suffix-stripping stemmer

use crate::stage::unexpected;
use sentiscope_core::{StageError, Value};

/// Strips the longest matching suffix from each token.
///
/// A suffix is only removed when at least `min_stem_len` characters remain.
#[derive(Debug, Clone)]
pub struct SuffixStemmer {
    suffixes: Vec<String>,
    min_stem_len: usize,
}

impl SuffixStemmer {
    pub fn new<I, S>(suffixes: I, min_stem_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suffixes: Vec<String> = suffixes
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        // longest first; ties keep declaration order
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));

        Self {
            suffixes,
            min_stem_len,
        }
    }

    pub fn stem(&self, word: &str) -> String {
        let word_len = word.chars().count();
        for suffix in &self.suffixes {
            if word.ends_with(suffix.as_str())
                && word_len - suffix.chars().count() >= self.min_stem_len
            {
                return word[..word.len() - suffix.len()].to_string();
            }
        }
        word.to_string()
    }

    pub(crate) fn apply(&self, stage: &str, input: &Value) -> Result<Value, StageError> {
        match input {
            Value::Tokens(tokens) => Ok(Value::Tokens(
                tokens.iter().map(|t| self.stem(t)).collect(),
            )),
            Value::Text(text) => Ok(Value::Tokens(
                text.split_whitespace().map(|t| self.stem(t)).collect(),
            )),
            other => Err(unexpected(stage, "text or tokens", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_suffix_wins() {
        let stemmer = SuffixStemmer::new(["s", "ing", "ings"], 3);
        assert_eq!(stemmer.stem("runs"), "run");
        assert_eq!(stemmer.stem("running"), "runn");
        assert_eq!(stemmer.stem("paintings"), "paint");
    }

    #[test]
    fn test_min_stem_len_protects_short_words() {
        let stemmer = SuffixStemmer::new(["s", "ing"], 3);
        assert_eq!(stemmer.stem("is"), "is");
        assert_eq!(stemmer.stem("sing"), "sing");
    }

    #[test]
    fn test_multibyte_suffixes() {
        let stemmer = SuffixStemmer::new(["ção", "ções"], 3);
        assert_eq!(stemmer.stem("avaliações"), "avalia");
        assert_eq!(stemmer.stem("avaliação"), "avalia");
    }

    #[test]
    fn test_text_input_is_split() {
        let stemmer = SuffixStemmer::new(["s"], 2);
        let out = stemmer.apply("stemming", &Value::from("cats dogs")).unwrap();
        assert_eq!(out, Value::Tokens(vec!["cat".into(), "dog".into()]));
    }
}
