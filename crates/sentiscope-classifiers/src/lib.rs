//! Sentiscope Classifiers
//!
//! Explainable sentiment classification over a fitted linear model.
//!
//! A request flows through three components:
//! - `TextPipeline`: ordered preprocessing stages (regex, stopwords,
//!   stemming, TF-IDF), with an optional per-stage trace
//! - `Classifier`: binary logistic regression over the final vector
//! - `AttributionEngine`: per-feature contributions for linear models
//!
//! `PredictionOrchestrator` composes them; `ModelHandle` loads the fitted
//! artifact once at startup.

pub mod attribution;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod explain;
pub mod model_loader;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod stage;
pub mod stemmer;
pub mod stopwords;
pub mod vectorizer;

pub use attribution::{
    rank_contributions, AttributionEngine, AttributionStrategy, InterventionalLinear,
    LinearFormula, StrategyKind,
};
pub use catalog::{CatalogEntry, StageCatalog};
pub use classifier::{Classifier, LinearModel, LogisticRegression};
pub use config::{
    ArtifactSpec, AttributionConfig, ExplainConfig, InferenceConfig, ModelSpec, StageSpec,
};
pub use explain::StageExplainer;
pub use model_loader::ModelHandle;
pub use normalizer::{RegexNormalizer, RegexRule};
pub use orchestrator::PredictionOrchestrator;
pub use pipeline::{PipelineBuilder, TextPipeline, TracedRun};
pub use stage::{Stage, StageOp};
pub use stemmer::SuffixStemmer;
pub use stopwords::StopwordFilter;
pub use vectorizer::{Norm, TfidfVectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attribution::AttributionEngine;
    pub use crate::classifier::{Classifier, LinearModel, LogisticRegression};
    pub use crate::config::InferenceConfig;
    pub use crate::model_loader::ModelHandle;
    pub use crate::orchestrator::PredictionOrchestrator;
    pub use crate::pipeline::TextPipeline;
    pub use crate::stage::Stage;
}
