//! CLI configuration

use sentiscope_classifiers::InferenceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Fitted model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Explanation and attribution settings
    #[serde(flatten)]
    pub inference: InferenceConfig,
}

/// Overrides taken from command-line flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub no_explain: bool,
    pub no_attribution: bool,
}

impl CliConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, overrides: &Overrides) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };
        config.inference.validate()?;

        // Apply CLI overrides
        if let Some(model) = &overrides.model {
            config.model_path = model.clone();
        }

        if overrides.no_explain {
            config.inference.explain.enabled = false;
        }

        if overrides.no_attribution {
            config.inference.attribution.enabled = false;
        }

        Ok(config)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            inference: InferenceConfig::default(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("demos/sentiment-model.yaml")
}
