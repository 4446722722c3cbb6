//! Per-feature attribution for linear classifiers
//!
//! Contributions are computed only for nonzero input features and are
//! expressed on the decision score `w · x + b` (positive values push toward
//! the Positive class). The strategy is chosen once at startup; a failing
//! strategy falls back to the exact formula `w_i * x_i`, and a failure of the
//! formula itself drops the whole bundle.

use crate::classifier::{Classifier, LinearModel};
use crate::config::AttributionConfig;
use sentiscope_core::{AttributionBundle, Contribution, Error, FeatureVector, Result, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default and maximum number of contributions kept in `top`
pub const DEFAULT_TOP_K: usize = 30;

/// Computes raw `(feature index, contribution)` pairs
pub trait AttributionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// One pair per nonzero entry of `vector`, in index order
    fn attribute(&self, vector: &FeatureVector, model: &LinearModel) -> Result<Vec<(usize, f64)>>;
}

/// Exact first-order linear attribution: `w_i * x_i`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearFormula;

impl AttributionStrategy for LinearFormula {
    fn name(&self) -> &str {
        "exact"
    }

    fn attribute(&self, vector: &FeatureVector, model: &LinearModel) -> Result<Vec<(usize, f64)>> {
        let weights = model.weights();
        vector
            .nonzero_entries()
            .into_iter()
            .map(|(i, x)| {
                weights
                    .get(i)
                    .map(|w| (i, w * x))
                    .ok_or_else(|| Error::attribution(format!("no weight for feature {}", i)))
            })
            .collect()
    }
}

/// Linear SHAP values under feature independence: `w_i * (x_i - mean_i)`.
///
/// Needs background feature means from the fitted artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterventionalLinear;

impl AttributionStrategy for InterventionalLinear {
    fn name(&self) -> &str {
        "interventional"
    }

    fn attribute(&self, vector: &FeatureVector, model: &LinearModel) -> Result<Vec<(usize, f64)>> {
        let means = model
            .feature_means()
            .ok_or_else(|| Error::attribution("model has no background feature means"))?;
        let weights = model.weights();

        vector
            .nonzero_entries()
            .into_iter()
            .map(|(i, x)| match (weights.get(i), means.get(i)) {
                (Some(w), Some(m)) => Ok((i, w * (x - m))),
                _ => Err(Error::attribution(format!("no parameters for feature {}", i))),
            })
            .collect()
    }
}

/// Strategy requested in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Exact,
    Interventional,
}

/// Ranks and packages feature contributions
#[derive(Clone)]
pub struct AttributionEngine {
    strategy: Arc<dyn AttributionStrategy>,
    top_k: usize,
    max_nonzero_features: Option<usize>,
}

impl AttributionEngine {
    pub fn new(strategy: Arc<dyn AttributionStrategy>) -> Self {
        Self {
            strategy,
            top_k: DEFAULT_TOP_K,
            max_nonzero_features: None,
        }
    }

    /// Engine using the exact linear formula
    pub fn exact() -> Self {
        Self::new(Arc::new(LinearFormula))
    }

    /// Pick a strategy for this classifier.
    ///
    /// Interventional attribution is only selected when the classifier is
    /// linear and carries feature means; otherwise the exact formula is used.
    pub fn select(kind: StrategyKind, classifier: &dyn Classifier) -> Self {
        let has_means = classifier
            .linear_model()
            .and_then(LinearModel::feature_means)
            .is_some();

        let engine = match kind {
            StrategyKind::Interventional if has_means => Self::new(Arc::new(InterventionalLinear)),
            StrategyKind::Interventional => {
                warn!("Interventional attribution requested but model has no feature means, using exact formula");
                Self::exact()
            }
            StrategyKind::Exact => Self::exact(),
        };

        info!("Attribution strategy: {}", engine.strategy_name());
        engine
    }

    /// Engine for `classifier` as described by `config`
    pub fn from_config(config: &AttributionConfig, classifier: &dyn Classifier) -> Self {
        Self::select(config.strategy, classifier)
            .with_top_k(config.top_k)
            .with_max_nonzero_features(config.max_nonzero_features)
    }

    /// Size of `top`, capped at [`DEFAULT_TOP_K`]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.min(DEFAULT_TOP_K);
        self
    }

    /// Refuse attribution for inputs with more nonzero features than `max`
    pub fn with_max_nonzero_features(mut self, max: Option<usize>) -> Self {
        self.max_nonzero_features = max;
        self
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Attribution bundle, or `None` when attribution is not possible
    pub fn attribute(
        &self,
        input: &Value,
        classifier: &dyn Classifier,
        feature_names: Option<&[String]>,
    ) -> Option<AttributionBundle> {
        match self.try_attribute(input, classifier, feature_names) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                metrics::counter!("sentiscope_attribution_failures_total").increment(1);
                warn!("Attribution unavailable: {}", e);
                None
            }
        }
    }

    /// Attribution with the failure reason exposed
    pub fn try_attribute(
        &self,
        input: &Value,
        classifier: &dyn Classifier,
        feature_names: Option<&[String]>,
    ) -> Result<AttributionBundle> {
        let model = classifier
            .linear_model()
            .ok_or_else(|| Error::attribution(format!("classifier '{}' is not linear", classifier.name())))?;
        let names = feature_names.ok_or_else(|| Error::attribution("feature names unavailable"))?;
        let vector = input
            .as_vector()
            .ok_or_else(|| Error::attribution(format!("input is {}, not a vector", input.kind_name())))?;

        if names.len() != model.n_features() || vector.dim() != model.n_features() {
            return Err(Error::attribution(format!(
                "dimension mismatch: {} names, {} features, {} weights",
                names.len(),
                vector.dim(),
                model.n_features()
            )));
        }

        if let Some(max) = self.max_nonzero_features {
            if vector.nnz() > max {
                return Err(Error::attribution(format!(
                    "{} nonzero features exceeds the limit of {}",
                    vector.nnz(),
                    max
                )));
            }
        }

        let raw = match self.strategy.attribute(vector, model) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(strategy = self.strategy.name(), "Falling back to exact formula: {}", e);
                LinearFormula.attribute(vector, model)?
            }
        };

        let contributions = raw
            .into_iter()
            .map(|(i, value)| {
                if !value.is_finite() {
                    return Err(Error::attribution(format!("non-finite contribution for feature {}", i)));
                }
                let feature = names
                    .get(i)
                    .ok_or_else(|| Error::attribution(format!("no name for feature {}", i)))?;
                Ok(Contribution {
                    feature: feature.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let top = rank_contributions(&contributions, self.top_k);

        Ok(AttributionBundle { contributions, top })
    }
}

impl std::fmt::Debug for AttributionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributionEngine")
            .field("strategy", &self.strategy.name())
            .field("top_k", &self.top_k)
            .field("max_nonzero_features", &self.max_nonzero_features)
            .finish()
    }
}

/// Contributions sorted by descending absolute value, truncated to `k`.
///
/// The sort is stable, so ties keep feature index order.
pub fn rank_contributions(contributions: &[Contribution], k: usize) -> Vec<Contribution> {
    let mut ranked = contributions.to_vec();
    ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
    ranked.truncate(k);
    ranked
}
