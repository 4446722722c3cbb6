//! Pipeline stage definitions
//!
//! A stage is a named, tagged operation. Each variant carries only the
//! capabilities its kind actually has: only [`StageOp::Vectorizer`] exposes
//! feature names, and dispatch is an exhaustive `match` rather than runtime
//! capability probing.

use crate::normalizer::RegexNormalizer;
use crate::stemmer::SuffixStemmer;
use crate::stopwords::StopwordFilter;
use crate::vectorizer::TfidfVectorizer;
use sentiscope_core::{StageError, Value};
use std::fmt;
use std::sync::Arc;

/// Signature of a custom stage transform
pub type TransformFn = dyn Fn(&[Value]) -> Result<Value, StageError> + Send + Sync;

/// A caller-supplied transform, used for mock pipelines and tests
#[derive(Clone)]
pub struct CustomTransform {
    kind: String,
    transform: Arc<TransformFn>,
}

impl CustomTransform {
    pub fn new<F>(kind: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, StageError> + Send + Sync + 'static,
    {
        Self {
            kind: kind.into(),
            transform: Arc::new(transform),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// The operation performed by a stage
#[derive(Clone)]
pub enum StageOp {
    Regex(RegexNormalizer),
    Stopwords(StopwordFilter),
    Stem(SuffixStemmer),
    Vectorizer(TfidfVectorizer),
    Custom(CustomTransform),
}

/// A named, ordered pipeline step
#[derive(Clone)]
pub struct Stage {
    name: String,
    op: StageOp,
}

impl Stage {
    pub fn new(name: impl Into<String>, op: StageOp) -> Self {
        Self {
            name: name.into(),
            op,
        }
    }

    pub fn regex(name: impl Into<String>, normalizer: RegexNormalizer) -> Self {
        Self::new(name, StageOp::Regex(normalizer))
    }

    pub fn stopwords(name: impl Into<String>, filter: StopwordFilter) -> Self {
        Self::new(name, StageOp::Stopwords(filter))
    }

    pub fn stem(name: impl Into<String>, stemmer: SuffixStemmer) -> Self {
        Self::new(name, StageOp::Stem(stemmer))
    }

    pub fn vectorizer(name: impl Into<String>, vectorizer: TfidfVectorizer) -> Self {
        Self::new(name, StageOp::Vectorizer(vectorizer))
    }

    /// Build a stage from a closure
    pub fn custom<F>(name: impl Into<String>, kind: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, StageError> + Send + Sync + 'static,
    {
        Self::new(name, StageOp::Custom(CustomTransform::new(kind, transform)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> &StageOp {
        &self.op
    }

    /// Implementation kind shown in traces
    pub fn kind(&self) -> &str {
        match &self.op {
            StageOp::Regex(_) => "RegexNormalizer",
            StageOp::Stopwords(_) => "StopwordFilter",
            StageOp::Stem(_) => "SuffixStemmer",
            StageOp::Vectorizer(_) => "TfidfVectorizer",
            StageOp::Custom(custom) => custom.kind(),
        }
    }

    /// Ordered feature names, present only for vectorizing stages
    pub fn feature_names(&self) -> Option<&[String]> {
        match &self.op {
            StageOp::Vectorizer(vectorizer) => Some(vectorizer.feature_names()),
            StageOp::Regex(_) | StageOp::Stopwords(_) | StageOp::Stem(_) | StageOp::Custom(_) => {
                None
            }
        }
    }

    /// Transform a batch into the next representation
    pub fn transform(&self, batch: &[Value]) -> Result<Value, StageError> {
        let name = self.name.as_str();
        match &self.op {
            StageOp::Regex(normalizer) => normalizer.apply(name, single_record(name, batch)?),
            StageOp::Stopwords(filter) => filter.apply(name, single_record(name, batch)?),
            StageOp::Stem(stemmer) => stemmer.apply(name, single_record(name, batch)?),
            StageOp::Vectorizer(vectorizer) => vectorizer.apply(name, single_record(name, batch)?),
            StageOp::Custom(custom) => (custom.transform)(batch),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// The only record of a batch of one
fn single_record<'a>(stage: &str, batch: &'a [Value]) -> Result<&'a Value, StageError> {
    match batch {
        [record] => Ok(record),
        [] => Err(StageError::EmptyBatch {
            stage: stage.to_string(),
        }),
        _ => Err(StageError::BatchSize {
            stage: stage.to_string(),
            len: batch.len(),
        }),
    }
}

/// Error for an input of the wrong representation
pub(crate) fn unexpected(stage: &str, expected: &'static str, found: &Value) -> StageError {
    StageError::UnexpectedInput {
        stage: stage.to_string(),
        expected,
        found: found.kind_name(),
    }
}
