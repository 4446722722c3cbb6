//! Prediction orchestrator
//!
//! Composes preprocessing, classification and attribution into one
//! synchronous call. Only the classifier may fail a request; explanation and
//! attribution degrade to `None`.

use crate::attribution::AttributionEngine;
use crate::config::InferenceConfig;
use crate::explain::StageExplainer;
use crate::model_loader::ModelHandle;
use crate::pipeline::{TextPipeline, TracedRun};
use sentiscope_core::{Error, PredictionResult, ResponseEnvelope, Result, StageTrace, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, warn};

/// Runs the full prediction flow against a shared model
#[derive(Debug, Clone)]
pub struct PredictionOrchestrator {
    model: Arc<ModelHandle>,
    explainer: Option<StageExplainer>,
    attribution: Option<AttributionEngine>,
}

impl PredictionOrchestrator {
    pub fn new(model: Arc<ModelHandle>, config: &InferenceConfig) -> Self {
        let explainer = config.explain.enabled.then(|| config.explain.explainer());
        let attribution = config
            .attribution
            .enabled
            .then(|| AttributionEngine::from_config(&config.attribution, model.classifier()));

        Self {
            model,
            explainer,
            attribution,
        }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Predict the sentiment of `text`.
    ///
    /// Fails only when the classifier cannot score the preprocessed input.
    pub fn predict(&self, text: &str) -> Result<ResponseEnvelope> {
        let start = Instant::now();
        let span = info_span!("predict", model = self.model.version(), bytes = text.len() as u64);
        let _guard = span.enter();

        let (input, explain) = self.preprocess(text);
        let classifier = self.model.classifier();

        let scores = classifier.predict(&input).map_err(|e| {
            metrics::counter!("sentiscope_classifier_errors_total").increment(1);
            error!(classifier = classifier.name(), "Classification failed: {}", e);
            e
        })?;

        let result = PredictionResult::from_scores(&scores).ok_or_else(|| {
            metrics::counter!("sentiscope_classifier_errors_total").increment(1);
            Error::classifier(format!("class index {} out of range", scores.class_index))
        })?;

        let attribution = self
            .attribution
            .as_ref()
            .and_then(|engine| engine.attribute(&input, classifier, self.model.feature_names()));

        let latency_us = start.elapsed().as_micros() as u64;
        metrics::counter!("sentiscope_predictions_total", "sentiment" => result.label.as_str())
            .increment(1);
        metrics::histogram!("sentiscope_predict_latency_us").record(latency_us as f64);
        debug!(
            sentiment = result.label.as_str(),
            probability = result.probability,
            latency_us,
            "Prediction complete"
        );

        Ok(ResponseEnvelope {
            sentiment: result.label,
            probability: result.probability,
            explain,
            attribution,
        })
    }

    /// Classifier input plus the optional stage traces
    fn preprocess(&self, text: &str) -> (Value, Option<Vec<StageTrace>>) {
        let Some(pipeline) = self.model.pipeline() else {
            debug!("No preprocessing pipeline, classifying raw text");
            return (Value::Text(text.to_string()), None);
        };

        let Some(explainer) = &self.explainer else {
            return (strict_input(pipeline, text), None);
        };

        let TracedRun {
            output,
            traces,
            degraded,
        } = pipeline.run_with_trace_using(text, explainer);

        // a degraded trace is for display only; classify the strict result
        let input = match output {
            Value::Vector(vector) if !degraded => Value::Vector(vector),
            _ => strict_input(pipeline, text),
        };

        (input, Some(traces))
    }
}

/// Strict pipeline output, or the raw text when preprocessing fails
fn strict_input(pipeline: &TextPipeline, text: &str) -> Value {
    match pipeline.run(text) {
        Ok(vector) => Value::Vector(vector),
        Err(e) => {
            warn!("Preprocessing failed, passing raw text to classifier: {}", e);
            Value::Text(text.to_string())
        }
    }
}
