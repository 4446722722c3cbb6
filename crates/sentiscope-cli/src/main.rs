//! Sentiscope CLI
//!
//! Explainable sentiment predictions from the command line.
//!
//! The model artifact is loaded once at startup; a load failure exits before
//! any prediction is attempted. Responses are written to stdout as JSON, logs
//! go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentiscope_classifiers::{ModelHandle, PredictionOrchestrator};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

mod config;

use config::{CliConfig, Overrides};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "sentiscope=info";

#[derive(Parser, Debug)]
#[command(name = "sentiscope")]
#[command(about = "Explainable sentiment classification", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "sentiscope.yaml")]
    config: String,

    /// Model artifact path (overrides the configuration file)
    #[arg(short, long, env = "SENTISCOPE_MODEL")]
    model: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the loaded model
    Info,

    /// Predict the sentiment of TEXT (read from stdin when omitted)
    Predict {
        text: Option<String>,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,

        /// Skip per-stage explanation
        #[arg(long)]
        no_explain: bool,

        /// Skip feature attribution
        #[arg(long)]
        no_attribution: bool,
    },
}

/// Response of the `info` command
#[derive(Debug, Serialize)]
struct ModelInfo<'a> {
    message: &'static str,
    model_version: &'a str,
    stages: Vec<&'a str>,
    vocabulary_size: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.log_json);

    let overrides = match &cli.command {
        Command::Predict {
            no_explain,
            no_attribution,
            ..
        } => Overrides {
            model: cli.model.clone(),
            no_explain: *no_explain,
            no_attribution: *no_attribution,
        },
        Command::Info => Overrides {
            model: cli.model.clone(),
            ..Overrides::default()
        },
    };

    // Load configuration
    let config = CliConfig::load(&cli.config, &overrides)?;
    debug!("Configuration loaded: {:?}", config);

    let model = ModelHandle::load(&config.model_path)
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;
    let model = Arc::new(model);
    info!("Model {} ready", model.version());

    match cli.command {
        Command::Info => {
            let info = ModelInfo {
                message: "Sentiment Analysis API",
                model_version: model.version(),
                stages: model
                    .pipeline()
                    .map(|p| p.stages().iter().map(|s| s.name()).collect())
                    .unwrap_or_default(),
                vocabulary_size: model.vocabulary_size(),
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Predict { text, pretty, .. } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };

            let orchestrator = PredictionOrchestrator::new(model.clone(), &config.inference);
            let response = orchestrator.predict(&text)?;

            let json = if pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string(&response)?
            };
            println!("{}", json);
        }
    }

    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read text from stdin")?;
    Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("sentiscope=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
