//! Regex-based text normalizer

use crate::stage::unexpected;
use regex::Regex;
use sentiscope_core::{Result, StageError, Value};

/// A compiled `(pattern, replacement)` rewrite
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: Regex,
    replacement: String,
}

impl RegexRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            sentiscope_core::Error::config(format!("Invalid normalizer pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Applies ordered regex rewrites to raw text.
///
/// Lowercasing happens before the rules; whitespace collapsing after.
#[derive(Debug, Clone)]
pub struct RegexNormalizer {
    lowercase: bool,
    rules: Vec<RegexRule>,
    collapse_whitespace: bool,
}

impl RegexNormalizer {
    /// Create a normalizer with no rules
    pub fn new() -> Self {
        Self {
            lowercase: false,
            rules: Vec::new(),
            collapse_whitespace: true,
        }
    }

    pub fn lowercase(mut self, enabled: bool) -> Self {
        self.lowercase = enabled;
        self
    }

    pub fn collapse_whitespace(mut self, enabled: bool) -> Self {
        self.collapse_whitespace = enabled;
        self
    }

    /// Append a rewrite rule
    pub fn rule(mut self, pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        self.rules.push(RegexRule::new(pattern, replacement)?);
        Ok(self)
    }

    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Normalize a single text
    pub fn normalize(&self, text: &str) -> String {
        let mut out = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        for rule in &self.rules {
            out = rule
                .pattern
                .replace_all(&out, rule.replacement.as_str())
                .into_owned();
        }

        if self.collapse_whitespace {
            out = out.split_whitespace().collect::<Vec<_>>().join(" ");
        }

        out
    }

    pub(crate) fn apply(&self, stage: &str, input: &Value) -> std::result::Result<Value, StageError> {
        match input {
            Value::Text(text) => Ok(Value::Text(self.normalize(text))),
            other => Err(unexpected(stage, "text", other)),
        }
    }
}

impl Default for RegexNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_only() {
        let normalizer = RegexNormalizer::new().lowercase(true);
        assert_eq!(normalizer.normalize("Good good"), "good good");
    }

    #[test]
    fn test_rules_apply_in_order() {
        let normalizer = RegexNormalizer::new()
            .lowercase(true)
            .rule(r"https?://\S+", " url ")
            .unwrap()
            .rule(r"\d+", " num ")
            .unwrap()
            .rule(r"[^\w\s]", " ")
            .unwrap();

        assert_eq!(
            normalizer.normalize("Paid 20 dollars, see http://x.io/a!"),
            "paid num dollars see url"
        );
    }

    #[test]
    fn test_capture_group_replacement() {
        let normalizer = RegexNormalizer::new()
            .rule(r"\b(not|never)\s+(\w+)", "${1}_$2")
            .unwrap();
        assert_eq!(normalizer.normalize("it is not good"), "it is not_good");
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = RegexNormalizer::new().rule("(unclosed", "").unwrap_err();
        assert!(matches!(err, sentiscope_core::Error::Config(_)));
    }

    #[test]
    fn test_rejects_non_text_input() {
        let normalizer = RegexNormalizer::new();
        let err = normalizer
            .apply("regex", &Value::Tokens(vec!["a".into()]))
            .unwrap_err();
        assert!(matches!(err, StageError::UnexpectedInput { expected: "text", .. }));
    }
}
