//! Classifier trait and the logistic regression implementation

use sentiscope_core::{ClassScores, Error, Result, Value};

/// Trait for all sentiment classifiers.
///
/// Implementations hold no per-call mutable state and are shared across
/// concurrent requests.
pub trait Classifier: Send + Sync {
    /// Score the final pipeline output
    fn predict(&self, input: &Value) -> Result<ClassScores>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Linear parameters, for classifiers that have them
    fn linear_model(&self) -> Option<&LinearModel> {
        None
    }
}

/// Fitted parameters of a linear decision function
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
    feature_means: Option<Vec<f64>>,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self> {
        if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
            return Err(Error::config("Linear model parameters must be finite"));
        }
        Ok(Self {
            weights,
            bias,
            feature_means: None,
        })
    }

    /// Attach background feature means (used by interventional attribution)
    pub fn with_feature_means(mut self, means: Vec<f64>) -> Result<Self> {
        if means.len() != self.weights.len() {
            return Err(Error::config(format!(
                "feature_means has {} entries but model has {} weights",
                means.len(),
                self.weights.len()
            )));
        }
        if means.iter().any(|m| !m.is_finite()) {
            return Err(Error::config("feature_means must be finite"));
        }
        self.feature_means = Some(means);
        Ok(self)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn feature_means(&self) -> Option<&[f64]> {
        self.feature_means.as_deref()
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Raw decision score `w · x + b`
    pub fn decision(&self, input: &Value) -> Result<f64> {
        let vector = input.as_vector().ok_or_else(|| {
            Error::classifier(format!(
                "expected a feature vector, got {}",
                input.kind_name()
            ))
        })?;

        let dot = vector.dot(&self.weights).ok_or_else(|| {
            Error::classifier(format!(
                "feature vector has {} dimensions but model expects {}",
                vector.dim(),
                self.weights.len()
            ))
        })?;

        let score = dot + self.bias;
        if !score.is_finite() {
            return Err(Error::classifier("non-finite decision score"));
        }
        Ok(score)
    }
}

/// Binary logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    name: String,
    model: LinearModel,
}

impl LogisticRegression {
    pub fn new(model: LinearModel) -> Self {
        Self::with_name("logistic_regression", model)
    }

    pub fn with_name(name: impl Into<String>, model: LinearModel) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, input: &Value) -> Result<ClassScores> {
        let score = self.model.decision(input)?;
        let p1 = sigmoid(score);
        let class_index = if score > 0.0 { 1 } else { 0 };

        Ok(ClassScores {
            class_index,
            probabilities: [1.0 - p1, p1],
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn linear_model(&self) -> Option<&LinearModel> {
        Some(&self.model)
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiscope_core::{FeatureVector, SparseVector};

    fn sparse(dim: usize, pairs: Vec<(usize, f64)>) -> Value {
        Value::Vector(FeatureVector::Sparse(SparseVector::from_pairs(dim, pairs)))
    }

    #[test]
    fn test_positive_prediction() {
        let clf = LogisticRegression::new(LinearModel::new(vec![2.0], 0.0).unwrap());
        let scores = clf.predict(&sparse(1, vec![(0, 2.0)])).unwrap();
        assert_eq!(scores.class_index, 1);
        assert!((scores.probabilities[1] - sigmoid(4.0)).abs() < 1e-15);
        assert!((scores.probabilities[0] + scores.probabilities[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bias_only_on_zero_vector() {
        let clf = LogisticRegression::new(LinearModel::new(vec![1.0, -1.0], -0.5).unwrap());
        let scores = clf.predict(&sparse(2, vec![])).unwrap();
        assert_eq!(scores.class_index, 0);
        assert!(scores.probabilities[0] > 0.5);
    }

    #[test]
    fn test_zero_score_is_negative() {
        let clf = LogisticRegression::new(LinearModel::new(vec![1.0], 0.0).unwrap());
        let scores = clf.predict(&sparse(1, vec![])).unwrap();
        assert_eq!(scores.class_index, 0);
        assert_eq!(scores.probabilities, [0.5, 0.5]);
    }

    #[test]
    fn test_rejects_text_and_wrong_dimension() {
        let clf = LogisticRegression::new(LinearModel::new(vec![1.0], 0.0).unwrap());
        assert!(matches!(
            clf.predict(&Value::from("raw text")),
            Err(Error::Classifier(_))
        ));
        assert!(matches!(
            clf.predict(&sparse(3, vec![(2, 1.0)])),
            Err(Error::Classifier(_))
        ));
    }

    #[test]
    fn test_extreme_scores_stay_in_range() {
        let clf = LogisticRegression::new(LinearModel::new(vec![1.0], 0.0).unwrap());
        for x in [-1e6, 1e6] {
            let scores = clf.predict(&Value::Vector(FeatureVector::Dense(vec![x]))).unwrap();
            for p in scores.probabilities {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_overflowing_score_is_an_error() {
        let clf = LogisticRegression::new(LinearModel::new(vec![1e308, -1e308], 0.0).unwrap());
        let input = Value::Vector(FeatureVector::Dense(vec![2.0, 2.0]));
        assert!(matches!(clf.predict(&input), Err(Error::Classifier(_))));
    }

    #[test]
    fn test_parameter_validation() {
        assert!(LinearModel::new(vec![f64::INFINITY], 0.0).is_err());
        let model = LinearModel::new(vec![1.0, 2.0], 0.0).unwrap();
        assert!(model.clone().with_feature_means(vec![0.1]).is_err());
        assert!(model.with_feature_means(vec![0.1, 0.2]).is_ok());
    }
}
