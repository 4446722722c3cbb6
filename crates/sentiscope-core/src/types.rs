//! Core types for sentiscope

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sparse numeric vector over a fixed vocabulary.
///
/// Indices are strictly increasing and explicit zeros are never stored, so
/// `nnz()` is exactly the number of nonzero features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an all-zero vector of the given dimension
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs.
    ///
    /// Repeated indices are summed; zero results and out-of-range indices
    /// are dropped.
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut acc: BTreeMap<usize, f64> = BTreeMap::new();
        for (index, value) in pairs {
            if index < dim {
                *acc.entry(index).or_insert(0.0) += value;
            }
        }

        let (indices, values): (Vec<usize>, Vec<f64>) = acc.into_iter().filter(|(_, v)| *v != 0.0).unzip();
        Self {
            dim,
            indices,
            values,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `index` (zero when not stored)
    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    /// Iterate stored `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Multiply every stored value by `factor`
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Final pipeline output consumed by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureVector {
    Dense(Vec<f64>),
    Sparse(SparseVector),
}

impl FeatureVector {
    pub fn dim(&self) -> usize {
        match self {
            Self::Dense(values) => values.len(),
            Self::Sparse(sparse) => sparse.dim(),
        }
    }

    /// Number of nonzero entries
    pub fn nnz(&self) -> usize {
        match self {
            Self::Dense(values) => values.iter().filter(|v| **v != 0.0).count(),
            Self::Sparse(sparse) => sparse.nnz(),
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        match self {
            Self::Dense(values) => values.get(index).copied().unwrap_or(0.0),
            Self::Sparse(sparse) => sparse.get(index),
        }
    }

    /// Nonzero `(index, value)` pairs in index order
    pub fn nonzero_entries(&self) -> Vec<(usize, f64)> {
        match self {
            Self::Dense(values) => values
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, v)| *v != 0.0)
                .collect(),
            Self::Sparse(sparse) => sparse.iter().collect(),
        }
    }

    /// Dot product with a weight vector; `None` when dimensions differ
    pub fn dot(&self, weights: &[f64]) -> Option<f64> {
        if weights.len() != self.dim() {
            return None;
        }
        let sum = match self {
            Self::Dense(values) => values.iter().zip(weights).map(|(x, w)| x * w).sum(),
            Self::Sparse(sparse) => sparse.iter().map(|(i, x)| x * weights[i]).sum(),
        };
        Some(sum)
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }
}

/// One record of an intermediate pipeline batch
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Tokens(Vec<String>),
    Vector(FeatureVector),
}

impl Value {
    /// Short representation name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Tokens(_) => "tokens",
            Self::Vector(_) => "vector",
        }
    }

    pub fn as_vector(&self) -> Option<&FeatureVector> {
        match self {
            Self::Vector(vector) => Some(vector),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<FeatureVector> {
        match self {
            Self::Vector(vector) => Some(vector),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<FeatureVector> for Value {
    fn from(vector: FeatureVector) -> Self {
        Self::Vector(vector)
    }
}

/// Binary sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    /// Map a classifier class index (0 → Negative, 1 → Positive)
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Negative),
            1 => Some(Self::Positive),
            _ => None,
        }
    }

    pub fn class_index(&self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    /// Predicted class (0 or 1)
    pub class_index: usize,

    /// Per-class probabilities `[p0, p1]`
    pub probabilities: [f64; 2],
}

/// Label plus the probability of the predicted class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Sentiment,
    pub probability: f64,
}

impl PredictionResult {
    /// Convert classifier scores; `None` for an out-of-range class index
    pub fn from_scores(scores: &ClassScores) -> Option<Self> {
        let label = Sentiment::from_class_index(scores.class_index)?;
        Some(Self {
            label,
            probability: scores.probabilities[scores.class_index],
        })
    }
}

/// Structured summary of a stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageResult {
    SparseMatrix {
        shape: (usize, usize),
        nonzero: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        top_features: Option<Vec<(String, f64)>>,
    },
    DenseArray {
        shape: (usize, usize),
        nonzero: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        top_features: Option<Vec<(String, f64)>>,
    },
    List {
        preview: Vec<String>,
    },
    Text {
        value: String,
    },
    None,
}

/// Human-readable record of one stage execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Stage name as declared in the pipeline
    pub step: String,

    /// Implementation kind, e.g. `TfidfVectorizer`
    pub kind: String,

    pub title: String,
    pub definition: String,
    pub example: String,

    pub input_text: String,
    pub output_text: String,

    pub result: StageResult,
}

/// Signed contribution of one feature to the decision score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: String,
    pub value: f64,
}

/// Per-feature attribution for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionBundle {
    /// One entry per nonzero input feature, in feature index order
    pub contributions: Vec<Contribution>,

    /// Largest contributions by absolute value
    pub top: Vec<Contribution>,
}

/// Single return value of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub sentiment: Sentiment,
    pub probability: f64,
    pub explain: Option<Vec<StageTrace>>,
    pub attribution: Option<AttributionBundle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_from_pairs_merges_and_drops_zeros() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 1.0), (4, 0.0), (9, 1.0)]);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 2.0]);
        assert_eq!(v.get(4), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_feature_vector_dot() {
        let sparse = FeatureVector::Sparse(SparseVector::from_pairs(3, vec![(0, 2.0), (2, 1.0)]));
        assert_eq!(sparse.dot(&[1.0, 5.0, -3.0]), Some(-1.0));
        assert_eq!(sparse.dot(&[1.0]), None);

        let dense = FeatureVector::Dense(vec![0.0, 1.5]);
        assert_eq!(dense.nnz(), 1);
        assert_eq!(dense.nonzero_entries(), vec![(1, 1.5)]);
    }

    #[test]
    fn test_prediction_from_scores() {
        let scores = ClassScores {
            class_index: 0,
            probabilities: [0.7, 0.3],
        };
        let result = PredictionResult::from_scores(&scores).unwrap();
        assert_eq!(result.label, Sentiment::Negative);
        assert_eq!(result.probability, 0.7);

        let bad = ClassScores {
            class_index: 2,
            probabilities: [0.5, 0.5],
        };
        assert!(PredictionResult::from_scores(&bad).is_none());
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = ResponseEnvelope {
            sentiment: Sentiment::Positive,
            probability: 0.9,
            explain: Some(vec![StageTrace {
                step: "vectorizer".into(),
                kind: "TfidfVectorizer".into(),
                title: "t".into(),
                definition: String::new(),
                example: String::new(),
                input_text: "good".into(),
                output_text: "[[1]]".into(),
                result: StageResult::SparseMatrix {
                    shape: (1, 1),
                    nonzero: 1,
                    top_features: Some(vec![("good".into(), 1.0)]),
                },
            }]),
            attribution: None,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["sentiment"], "Positive");
        assert!(json["attribution"].is_null());
        assert_eq!(json["explain"][0]["result"]["type"], "sparse_matrix");
        assert_eq!(json["explain"][0]["result"]["shape"][1], 1);
        assert_eq!(json["explain"][0]["result"]["top_features"][0][0], "good");
    }

    #[test]
    fn test_none_result_tag() {
        let json = serde_json::to_value(StageResult::None).unwrap();
        assert_eq!(json["type"], "none");
    }
}
