//! Text preprocessing pipeline
//!
//! Stages run strictly in declaration order. Each stage receives the previous
//! output wrapped in a batch of one.
//!
//! Two execution modes exist:
//! - [`TextPipeline::run`] is strict: the first stage error aborts the run.
//! - [`TextPipeline::run_with_trace`] never aborts. A failing stage is re-run
//!   on the original raw text; if that fails as well the stage is recorded
//!   with an empty output and the next stage receives the last value that was
//!   successfully produced. Traces after a skipped stage may therefore repeat
//!   an earlier value.

use crate::explain::StageExplainer;
use crate::stage::Stage;
use sentiscope_core::{FeatureVector, Result, StageError, StageTrace, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// An ordered sequence of preprocessing stages
#[derive(Debug, Clone)]
pub struct TextPipeline {
    stages: Vec<Stage>,
}

/// Outcome of a traced run
#[derive(Debug, Clone)]
pub struct TracedRun {
    /// Last successfully produced value
    pub output: Value,

    /// One trace per stage, in pipeline order
    pub traces: Vec<StageTrace>,

    /// True when any stage needed the raw-text fallback or was skipped
    pub degraded: bool,
}

impl TracedRun {
    /// Final vector, only when every stage succeeded on its proper input
    pub fn vector(&self) -> Option<&FeatureVector> {
        if self.degraded {
            None
        } else {
            self.output.as_vector()
        }
    }
}

impl TextPipeline {
    /// Start building a pipeline
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Feature names of the final stage, when it is a vectorizer
    pub fn feature_names(&self) -> Option<&[String]> {
        self.stages.last().and_then(Stage::feature_names)
    }

    /// Run every stage strictly and return the final feature vector
    pub fn run(&self, text: &str) -> std::result::Result<FeatureVector, StageError> {
        let mut current = Value::Text(text.to_string());

        for stage in &self.stages {
            current = stage.transform(std::slice::from_ref(&current))?;
        }

        match current {
            Value::Vector(vector) => Ok(vector),
            other => Err(StageError::NotVectorized {
                stage: self
                    .stages
                    .last()
                    .map(|s| s.name().to_string())
                    .unwrap_or_default(),
                found: other.kind_name(),
            }),
        }
    }

    /// Run with the default explainer
    pub fn run_with_trace(&self, text: &str) -> TracedRun {
        self.run_with_trace_using(text, &StageExplainer::default())
    }

    /// Run every stage, recording a trace per stage and never aborting
    pub fn run_with_trace_using(&self, text: &str, explainer: &StageExplainer) -> TracedRun {
        let raw = [Value::Text(text.to_string())];
        let mut current = raw.to_vec();
        let mut traces = Vec::with_capacity(self.stages.len());
        let mut degraded = false;

        for stage in &self.stages {
            let output = match stage.transform(&current) {
                Ok(value) => Some(value),
                Err(err) => {
                    degraded = true;
                    metrics::counter!("sentiscope_stage_fallbacks_total").increment(1);
                    warn!(
                        stage = stage.name(),
                        error = %err,
                        "Stage failed, retrying on raw text"
                    );
                    // TODO: retry on the predecessor's output once the intended
                    // fallback semantics are confirmed; raw text can desync
                    // this stage from the rest of the pipeline.
                    match stage.transform(&raw) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            warn!(
                                stage = stage.name(),
                                error = %err,
                                "Stage fallback failed, skipping stage"
                            );
                            None
                        }
                    }
                }
            };

            traces.push(explainer.explain(stage, &current, output.as_ref()));
            debug!(stage = stage.name(), kind = stage.kind(), "Stage traced");

            if let Some(value) = output {
                current = vec![value];
            }
        }

        let output = current
            .pop()
            .unwrap_or_else(|| Value::Text(text.to_string()));

        TracedRun {
            output,
            traces,
            degraded,
        }
    }
}

/// Builder for constructing pipelines fluently
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build the pipeline, rejecting duplicate stage names
    pub fn build(self) -> Result<TextPipeline> {
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name().to_string()) {
                return Err(sentiscope_core::Error::config(format!(
                    "Duplicate stage name '{}'",
                    stage.name()
                )));
            }
        }

        Ok(TextPipeline {
            stages: self.stages,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::RegexNormalizer;
    use crate::stemmer::SuffixStemmer;
    use crate::stopwords::StopwordFilter;
    use crate::vectorizer::TfidfVectorizer;
    use sentiscope_core::StageResult;

    fn toy_pipeline() -> TextPipeline {
        TextPipeline::builder()
            .stage(Stage::regex("regex", RegexNormalizer::new().lowercase(true)))
            .stage(Stage::vectorizer(
                "vectorizer",
                TfidfVectorizer::new(vec!["good".to_string()]).unwrap(),
            ))
            .build()
            .unwrap()
    }

    fn failing_stage(name: &str) -> Stage {
        Stage::custom(name, "AlwaysFails", |_: &[Value]| {
            Err(StageError::failed("broken", "synthetic failure"))
        })
    }

    #[test]
    fn test_strict_run() {
        let vector = toy_pipeline().run("Good good").unwrap();
        assert_eq!(vector.dim(), 1);
        assert_eq!(vector.get(0), 2.0);
    }

    #[test]
    fn test_traced_run_matches_strict_run() {
        let pipeline = toy_pipeline();
        let traced = pipeline.run_with_trace("Good good");

        assert!(!traced.degraded);
        assert_eq!(traced.traces.len(), 2);
        assert_eq!(traced.traces[0].input_text, "Good good");
        assert_eq!(traced.traces[0].output_text, "good good");
        assert_eq!(traced.traces[1].input_text, "good good");
        assert_eq!(traced.vector(), Some(&pipeline.run("Good good").unwrap()));
    }

    #[test]
    fn test_not_vectorized() {
        let pipeline = TextPipeline::builder()
            .stage(Stage::regex("regex", RegexNormalizer::new()))
            .build()
            .unwrap();
        let err = pipeline.run("text").unwrap_err();
        assert!(matches!(err, StageError::NotVectorized { found: "text", .. }));
    }

    #[test]
    fn test_skip_and_continue_uses_last_good_value() {
        let pipeline = TextPipeline::builder()
            .stage(Stage::regex("regex", RegexNormalizer::new().lowercase(true)))
            .stage(failing_stage("broken"))
            .stage(Stage::vectorizer(
                "vectorizer",
                TfidfVectorizer::new(vec!["good".to_string()]).unwrap(),
            ))
            .build()
            .unwrap();

        assert!(pipeline.run("Good good").is_err());

        let traced = pipeline.run_with_trace("Good good");
        assert!(traced.degraded);
        assert_eq!(traced.traces.len(), 3);
        assert_eq!(traced.traces[1].output_text, "");
        assert_eq!(traced.traces[1].result, StageResult::None);
        // the vectorizer saw the regex output, not the failed stage's
        assert_eq!(traced.traces[2].input_text, "good good");
        assert_eq!(traced.output.as_vector().unwrap().get(0), 2.0);
        assert!(traced.vector().is_none());
    }

    #[test]
    fn test_fallback_reruns_on_raw_text() {
        // the stemmer cannot take a vector, but succeeds on the raw text
        let pipeline = TextPipeline::builder()
            .stage(Stage::vectorizer(
                "vectorizer",
                TfidfVectorizer::new(vec!["cats".to_string()]).unwrap(),
            ))
            .stage(Stage::stem("stemming", SuffixStemmer::new(["s"], 2)))
            .build()
            .unwrap();

        let traced = pipeline.run_with_trace("Cats");
        assert!(traced.degraded);
        assert_eq!(traced.traces[1].output_text, "Cat");
        assert_eq!(traced.output, Value::Tokens(vec!["Cat".into()]));
    }

    #[test]
    fn test_full_stage_chain() {
        let pipeline = TextPipeline::builder()
            .stage(Stage::regex(
                "regex",
                RegexNormalizer::new()
                    .lowercase(true)
                    .rule(r"[^\w\s]", " ")
                    .unwrap(),
            ))
            .stage(Stage::stopwords(
                "stopwords",
                StopwordFilter::new(["the", "was"]).unwrap(),
            ))
            .stage(Stage::stem("stemming", SuffixStemmer::new(["s", "ed"], 3)))
            .stage(Stage::vectorizer(
                "vectorizer",
                TfidfVectorizer::new(vec!["love".to_string(), "product".to_string()]).unwrap(),
            ))
            .build()
            .unwrap();

        let traced = pipeline.run_with_trace("The products, the LOVED!");
        assert!(!traced.degraded);
        assert_eq!(traced.traces[1].output_text, "products loved");
        assert_eq!(traced.traces[2].output_text, "product lov");
        assert_eq!(pipeline.feature_names().unwrap().len(), 2);
        let vector = traced.vector().unwrap();
        assert_eq!(vector.nnz(), 1);
        assert_eq!(vector.get(1), 1.0);
    }

    #[test]
    fn test_duplicate_stage_names_rejected() {
        let result = TextPipeline::builder()
            .stage(Stage::regex("regex", RegexNormalizer::new()))
            .stage(Stage::regex("regex", RegexNormalizer::new()))
            .build();
        assert!(result.is_err());
    }
}
