//! Error types for sentiscope

/// Result type alias using sentiscope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sentiscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The trained artifact could not be loaded (startup only)
    #[error("model unavailable: {0}")]
    ArtifactLoad(String),

    /// A preprocessing stage failed during a strict run
    #[error("stage error: {0}")]
    Stage(#[from] StageError),

    /// The classifier could not score its input
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Attribution computation failed
    #[error("attribution error: {0}")]
    Attribution(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new artifact load error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::ArtifactLoad(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new attribution error
    pub fn attribution(msg: impl Into<String>) -> Self {
        Self::Attribution(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Failure of a single preprocessing stage.
///
/// Stages return this instead of panicking; the traced pipeline run turns it
/// into a fallback, the strict run propagates it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error("stage '{stage}' received an empty batch")]
    EmptyBatch { stage: String },

    #[error("stage '{stage}' expects a batch of one record, got {len}")]
    BatchSize { stage: String, len: usize },

    #[error("stage '{stage}' expects {expected} input, got {found}")]
    UnexpectedInput {
        stage: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("pipeline ended at stage '{stage}' with {found} output instead of a feature vector")]
    NotVectorized { stage: String, found: &'static str },

    #[error("stage '{stage}' failed: {reason}")]
    Failed { stage: String, reason: String },
}

impl StageError {
    /// Create a generic stage failure
    pub fn failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
