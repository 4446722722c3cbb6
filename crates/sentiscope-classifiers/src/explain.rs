//! Stage explainer: turns stage input/output snapshots into [`StageTrace`]s
//!
//! Rendering rules for intermediate values:
//! - text passes through unchanged
//! - token sequences are joined with single spaces
//! - vectors render as their dense array form, capped at
//!   `max_rendered_values` entries
//!
//! Vector outputs of stages that expose feature names also list the nonzero
//! `(feature, weight)` pairs, highest weight first.

use crate::catalog::StageCatalog;
use crate::stage::Stage;
use sentiscope_core::{FeatureVector, StageResult, StageTrace, Value};
use std::fmt::Write as _;

/// Default cap on `top_features` entries
pub const DEFAULT_MAX_TOP_FEATURES: usize = 200;

/// Default cap on rendered vector entries
pub const DEFAULT_MAX_RENDERED_VALUES: usize = 2_000;

/// Cap on token previews
const MAX_PREVIEW: usize = 200;

/// Builds human-readable stage records
#[derive(Debug, Clone)]
pub struct StageExplainer {
    catalog: StageCatalog,
    max_top_features: usize,
    max_rendered_values: usize,
}

impl StageExplainer {
    pub fn new(catalog: StageCatalog) -> Self {
        Self {
            catalog,
            max_top_features: DEFAULT_MAX_TOP_FEATURES,
            max_rendered_values: DEFAULT_MAX_RENDERED_VALUES,
        }
    }

    pub fn with_max_top_features(mut self, max: usize) -> Self {
        self.max_top_features = max;
        self
    }

    pub fn with_max_rendered_values(mut self, max: usize) -> Self {
        self.max_rendered_values = max;
        self
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Produce the trace for one stage execution.
    ///
    /// `output` is `None` when the stage and its fallback both failed.
    pub fn explain(&self, stage: &Stage, input: &[Value], output: Option<&Value>) -> StageTrace {
        let entry = self.catalog.describe(stage.name(), stage.kind());

        StageTrace {
            step: stage.name().to_string(),
            kind: stage.kind().to_string(),
            title: entry.title,
            definition: entry.definition,
            example: entry.example,
            input_text: self.render_batch(input),
            output_text: output.map(|v| self.render_value(v)).unwrap_or_default(),
            result: self.summarize(stage, output),
        }
    }

    /// Render a batch by joining its rendered records with spaces
    pub fn render_batch(&self, batch: &[Value]) -> String {
        batch
            .iter()
            .map(|v| self.render_value(v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn render_value(&self, value: &Value) -> String {
        match value {
            Value::Text(text) => text.clone(),
            Value::Tokens(tokens) => tokens.join(" "),
            Value::Vector(vector) => self.render_vector(vector),
        }
    }

    fn render_vector(&self, vector: &FeatureVector) -> String {
        let dim = vector.dim();
        let shown = dim.min(self.max_rendered_values);

        let mut out = String::from("[[");
        for i in 0..shown {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}", vector.get(i));
        }
        if shown < dim {
            let _ = write!(out, " ... ({} more)", dim - shown);
        }
        out.push_str("]]");
        out
    }

    /// Structured summary of a stage output
    pub fn summarize(&self, stage: &Stage, output: Option<&Value>) -> StageResult {
        match output {
            None => StageResult::None,
            Some(Value::Text(text)) => StageResult::Text {
                value: text.clone(),
            },
            Some(Value::Tokens(tokens)) => StageResult::List {
                preview: tokens.iter().take(MAX_PREVIEW).cloned().collect(),
            },
            Some(Value::Vector(vector)) => {
                let shape = (1, vector.dim());
                let nonzero = vector.nnz();
                let top_features = stage
                    .feature_names()
                    .map(|names| self.top_features(vector, names));

                if vector.is_sparse() {
                    StageResult::SparseMatrix {
                        shape,
                        nonzero,
                        top_features,
                    }
                } else {
                    StageResult::DenseArray {
                        shape,
                        nonzero,
                        top_features,
                    }
                }
            }
        }
    }

    /// Nonzero `(feature, weight)` pairs, descending by weight
    fn top_features(&self, vector: &FeatureVector, names: &[String]) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = vector
            .nonzero_entries()
            .into_iter()
            .filter_map(|(i, v)| names.get(i).map(|name| (name.clone(), v)))
            .collect();

        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs.truncate(self.max_top_features);
        pairs
    }
}

impl Default for StageExplainer {
    fn default() -> Self {
        Self::new(StageCatalog::default())
    }
}
