//! Sentiscope Core
//!
//! Core types and error handling shared across sentiscope components.
//!
//! This crate provides:
//! - Intermediate pipeline records (`Value`) and feature vectors
//! - Prediction, explanation and attribution result types
//! - The error taxonomy and result alias

pub mod error;
pub mod types;

pub use error::{Error, Result, StageError};
pub use types::{
    AttributionBundle, ClassScores, Contribution, FeatureVector, PredictionResult,
    ResponseEnvelope, Sentiment, SparseVector, StageResult, StageTrace, Value,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, StageError};
    pub use crate::types::{FeatureVector, PredictionResult, ResponseEnvelope, Sentiment, Value};
}
