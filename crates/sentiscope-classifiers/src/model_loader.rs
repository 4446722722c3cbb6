//! Loading of the fitted model artifact
//!
//! The artifact is loaded once at startup. Every failure here surfaces as
//! [`Error::ArtifactLoad`]; nothing is loaded lazily per request.

use crate::classifier::Classifier;
use crate::config::ArtifactSpec;
use crate::pipeline::TextPipeline;
use sentiscope_core::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable, shareable handle to the loaded model
#[derive(Clone)]
pub struct ModelHandle {
    version: String,
    pipeline: Option<TextPipeline>,
    classifier: Arc<dyn Classifier>,
}

impl ModelHandle {
    /// Assemble a handle from already built parts.
    ///
    /// When both the pipeline and the classifier are linear-aware, the
    /// vectorizer's vocabulary must match the weight count.
    pub fn new(
        version: impl Into<String>,
        pipeline: Option<TextPipeline>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::artifact("artifact version is empty"));
        }

        if let (Some(pipeline), Some(model)) = (&pipeline, classifier.linear_model()) {
            let names = pipeline
                .feature_names()
                .ok_or_else(|| Error::artifact("final preprocessing stage does not vectorize"))?;
            if names.len() != model.n_features() {
                return Err(Error::artifact(format!(
                    "vectorizer has {} features but classifier has {} weights",
                    names.len(),
                    model.n_features()
                )));
            }
        }

        Ok(Self {
            version,
            pipeline,
            classifier,
        })
    }

    /// Load the artifact from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading model artifact from {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::artifact(format!("cannot read {}: {}", path.display(), e)))?;

        Self::from_yaml(&content)
    }

    /// Load the artifact from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let spec: ArtifactSpec = serde_yaml::from_str(yaml)
            .map_err(|e| Error::artifact(format!("invalid artifact: {}", e)))?;
        Self::from_spec(&spec)
    }

    /// Build runtime components from a parsed artifact
    pub fn from_spec(spec: &ArtifactSpec) -> Result<Self> {
        let pipeline = match &spec.text_prep {
            Some(text_prep) => {
                if text_prep.stages.is_empty() {
                    return Err(Error::artifact("text_prep has no stages"));
                }

                let mut builder = TextPipeline::builder();
                for stage_spec in &text_prep.stages {
                    let stage = stage_spec.to_stage().map_err(|e| {
                        Error::artifact(format!("stage '{}': {}", stage_spec.name(), e))
                    })?;
                    debug!(stage = stage.name(), kind = stage.kind(), "Built stage");
                    builder = builder.stage(stage);
                }
                Some(builder.build().map_err(|e| Error::artifact(e.to_string()))?)
            }
            None => None,
        };

        let classifier = spec
            .model
            .to_classifier()
            .map_err(|e| Error::artifact(format!("model: {}", e)))?;

        let handle = Self::new(spec.version.clone(), pipeline, classifier)?;

        info!(
            "Loaded model {} ({} stages, {} features)",
            handle.version,
            handle.pipeline.as_ref().map_or(0, TextPipeline::stage_count),
            spec.model.n_features()
        );

        Ok(handle)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pipeline(&self) -> Option<&TextPipeline> {
        self.pipeline.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Feature names of the final vectorizing stage
    pub fn feature_names(&self) -> Option<&[String]> {
        self.pipeline.as_ref().and_then(TextPipeline::feature_names)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.feature_names().map_or(0, <[String]>::len)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("version", &self.version)
            .field("pipeline", &self.pipeline)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}
