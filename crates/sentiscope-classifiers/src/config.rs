//! Configuration for inference and the fitted-model artifact

use crate::attribution::{StrategyKind, DEFAULT_TOP_K};
use crate::catalog::{CatalogEntry, StageCatalog};
use crate::classifier::{Classifier, LinearModel, LogisticRegression};
use crate::explain::{StageExplainer, DEFAULT_MAX_RENDERED_VALUES, DEFAULT_MAX_TOP_FEATURES};
use crate::normalizer::RegexNormalizer;
use crate::stage::Stage;
use crate::stemmer::SuffixStemmer;
use crate::stopwords::StopwordFilter;
use crate::vectorizer::{Norm, TfidfVectorizer};
use sentiscope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Runtime behaviour of the prediction orchestrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Per-stage explanation settings
    #[serde(default)]
    pub explain: ExplainConfig,

    /// Feature attribution settings
    #[serde(default)]
    pub attribution: AttributionConfig,
}

/// Explanation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// When false, responses never carry stage traces
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cap on vectorizer `top_features`
    #[serde(default = "default_max_top_features")]
    pub max_top_features: usize,

    /// Cap on rendered vector entries
    #[serde(default = "default_max_rendered_values")]
    pub max_rendered_values: usize,

    /// Additional or replacement catalog entries, by stage name
    #[serde(default)]
    pub catalog: HashMap<String, CatalogEntry>,
}

/// Attribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub strategy: StrategyKind,

    /// Number of contributions kept in `top`, at most 30
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Inputs with more nonzero features get no attribution; `null` disables the cap
    #[serde(default = "default_max_nonzero_features")]
    pub max_nonzero_features: Option<usize>,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_top_features: default_max_top_features(),
            max_rendered_values: default_max_rendered_values(),
            catalog: HashMap::new(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: StrategyKind::default(),
            top_k: default_top_k(),
            max_nonzero_features: default_max_nonzero_features(),
        }
    }
}

impl InferenceConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

impl InferenceConfig {
    /// Reject settings outside the supported ranges
    pub fn validate(&self) -> Result<()> {
        if self.attribution.top_k > DEFAULT_TOP_K {
            return Err(Error::config(format!(
                "attribution.top_k must be at most {}, got {}",
                DEFAULT_TOP_K, self.attribution.top_k
            )));
        }
        Ok(())
    }
}

impl ExplainConfig {
    /// Explainer using the built-in catalog plus configured overrides
    pub fn explainer(&self) -> StageExplainer {
        let mut catalog = StageCatalog::default();
        for (name, entry) in &self.catalog {
            catalog.insert(name, entry.clone());
        }

        StageExplainer::new(catalog)
            .with_max_top_features(self.max_top_features)
            .with_max_rendered_values(self.max_rendered_values)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_top_features() -> usize {
    DEFAULT_MAX_TOP_FEATURES
}

fn default_max_rendered_values() -> usize {
    DEFAULT_MAX_RENDERED_VALUES
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_nonzero_features() -> Option<usize> {
    Some(5_000)
}

/// Fitted model artifact (YAML document)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub version: String,

    /// Absent when the artifact ships only a classifier
    #[serde(default)]
    pub text_prep: Option<TextPrepSpec>,

    pub model: ModelSpec,
}

/// Preprocessing section of the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPrepSpec {
    pub stages: Vec<StageSpec>,
}

/// One rewrite rule of a regex stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,

    #[serde(default)]
    pub replacement: String,
}

/// Preprocessing stage entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    Regex {
        name: String,
        #[serde(default)]
        lowercase: bool,
        #[serde(default)]
        rules: Vec<RuleSpec>,
        #[serde(default = "default_true")]
        collapse_whitespace: bool,
    },

    Stopwords {
        name: String,
        words: Vec<String>,
    },

    Stemmer {
        name: String,
        suffixes: Vec<String>,
        #[serde(default = "default_min_stem_len")]
        min_stem_len: usize,
    },

    Tfidf {
        name: String,
        vocabulary: Vec<String>,
        #[serde(default)]
        idf: Option<Vec<f64>>,
        #[serde(default)]
        norm: Norm,
        #[serde(default)]
        sublinear_tf: bool,
        #[serde(default = "default_ngram_range")]
        ngram_range: (usize, usize),
        #[serde(default = "default_true")]
        lowercase: bool,
        #[serde(default)]
        token_pattern: Option<String>,
    },
}

/// Classifier entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression {
        weights: Vec<f64>,
        #[serde(default)]
        bias: f64,
        #[serde(default)]
        feature_means: Option<Vec<f64>>,
    },
}

fn default_min_stem_len() -> usize {
    3
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl StageSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Regex { name, .. }
            | Self::Stopwords { name, .. }
            | Self::Stemmer { name, .. }
            | Self::Tfidf { name, .. } => name,
        }
    }

    /// Vocabulary size for vectorizing stages
    pub fn vocabulary_size(&self) -> Option<usize> {
        match self {
            Self::Tfidf { vocabulary, .. } => Some(vocabulary.len()),
            _ => None,
        }
    }

    /// Convert to a runtime stage
    pub fn to_stage(&self) -> Result<Stage> {
        let stage = match self {
            Self::Regex {
                name,
                lowercase,
                rules,
                collapse_whitespace,
            } => {
                let mut normalizer = RegexNormalizer::new()
                    .lowercase(*lowercase)
                    .collapse_whitespace(*collapse_whitespace);
                for rule in rules {
                    normalizer = normalizer.rule(&rule.pattern, rule.replacement.clone())?;
                }
                Stage::regex(name.clone(), normalizer)
            }

            Self::Stopwords { name, words } => {
                Stage::stopwords(name.clone(), StopwordFilter::new(words)?)
            }

            Self::Stemmer {
                name,
                suffixes,
                min_stem_len,
            } => Stage::stem(name.clone(), SuffixStemmer::new(suffixes.clone(), *min_stem_len)),

            Self::Tfidf {
                name,
                vocabulary,
                idf,
                norm,
                sublinear_tf,
                ngram_range,
                lowercase,
                token_pattern,
            } => {
                let mut vectorizer = TfidfVectorizer::new(vocabulary.clone())?
                    .with_norm(*norm)
                    .sublinear_tf(*sublinear_tf)
                    .lowercase(*lowercase)
                    .with_ngram_range(ngram_range.0, ngram_range.1)?;
                if let Some(idf) = idf {
                    vectorizer = vectorizer.with_idf(idf.clone())?;
                }
                if let Some(pattern) = token_pattern {
                    vectorizer = vectorizer.with_token_pattern(pattern)?;
                }
                Stage::vectorizer(name.clone(), vectorizer)
            }
        };

        Ok(stage)
    }
}

impl ModelSpec {
    pub fn n_features(&self) -> usize {
        match self {
            Self::LogisticRegression { weights, .. } => weights.len(),
        }
    }

    /// Convert to a runtime classifier
    pub fn to_classifier(&self) -> Result<Arc<dyn Classifier>> {
        match self {
            Self::LogisticRegression {
                weights,
                bias,
                feature_means,
            } => {
                let mut model = LinearModel::new(weights.clone(), *bias)?;
                if let Some(means) = feature_means {
                    model = model.with_feature_means(means.clone())?;
                }
                Ok(Arc::new(LogisticRegression::new(model)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_config_defaults() {
        let config = InferenceConfig::from_yaml("{}").unwrap();
        assert!(config.explain.enabled);
        assert_eq!(config.explain.max_top_features, 200);
        assert_eq!(config.explain.max_rendered_values, 2000);
        assert!(config.attribution.enabled);
        assert_eq!(config.attribution.strategy, StrategyKind::Exact);
        assert_eq!(config.attribution.top_k, 30);
        assert_eq!(config.attribution.max_nonzero_features, Some(5000));
    }

    #[test]
    fn test_inference_config_yaml() {
        let yaml = r#"
explain:
  enabled: false
  catalog:
    cleanup:
      title: Text Cleanup
attribution:
  strategy: interventional
  top_k: 5
  max_nonzero_features: null
"#;
        let config = InferenceConfig::from_yaml(yaml).unwrap();
        assert!(!config.explain.enabled);
        assert_eq!(config.attribution.strategy, StrategyKind::Interventional);
        assert_eq!(config.attribution.top_k, 5);
        assert_eq!(config.attribution.max_nonzero_features, None);

        let explainer = config.explain.explainer();
        let entry = explainer.catalog().lookup("Cleanup").unwrap();
        assert_eq!(entry.title, "Text Cleanup");
        assert!(explainer.catalog().lookup("regex").is_some());
    }

    #[test]
    fn test_top_k_above_limit_is_rejected() {
        let err = InferenceConfig::from_yaml("attribution:\n  top_k: 100\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(InferenceConfig::from_yaml("attribution:\n  top_k: 30\n").is_ok());
    }

    #[test]
    fn test_stage_spec_kinds() {
        let yaml = r#"
- { name: regex, kind: regex, lowercase: true, rules: [{ pattern: "\\d+", replacement: " " }] }
- { name: stopwords, kind: stopwords, words: [the] }
- { name: stemming, kind: stemmer, suffixes: [s] }
- { name: vectorizer, kind: tfidf, vocabulary: [good, bad], norm: none, ngram_range: [1, 2] }
"#;
        let specs: Vec<StageSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[3].vocabulary_size(), Some(2));
        assert_eq!(specs[2].vocabulary_size(), None);

        let stages: Vec<Stage> = specs.iter().map(|s| s.to_stage().unwrap()).collect();
        assert_eq!(stages[0].kind(), "RegexNormalizer");
        assert_eq!(stages[3].feature_names().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_stage_spec() {
        let spec = StageSpec::Regex {
            name: "regex".into(),
            lowercase: false,
            rules: vec![RuleSpec {
                pattern: "(".into(),
                replacement: String::new(),
            }],
            collapse_whitespace: true,
        };
        assert!(spec.to_stage().is_err());
    }

    #[test]
    fn test_model_spec() {
        let spec: ModelSpec =
            serde_yaml::from_str("{ kind: logistic_regression, weights: [1.0, -1.0] }").unwrap();
        assert_eq!(spec.n_features(), 2);
        let clf = spec.to_classifier().unwrap();
        assert_eq!(clf.name(), "logistic_regression");
        assert_eq!(clf.linear_model().unwrap().bias(), 0.0);
    }
}
