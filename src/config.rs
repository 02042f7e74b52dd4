use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::eval::DEFAULT_K;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub eval: EvalConfig,
}

/// Metric suite configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    /// Cutoff for the precision/recall metric.
    #[serde(default = "default_k")]
    pub precision_k: usize,
    /// Cutoff for the NDCG metric.
    #[serde(default = "default_k")]
    pub ndcg_k: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            precision_k: default_k(),
            ndcg_k: default_k(),
            log_level: default_log_level(),
        }
    }
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in GRAPHRAG_EVAL_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// A missing ./config.toml falls back to defaults; a missing file named by
    /// GRAPHRAG_EVAL_CONFIG is an error.
    pub fn load() -> Result<Self> {
        // Optional file, errors ignored
        let _ = dotenv::dotenv();

        match std::env::var("GRAPHRAG_EVAL_CONFIG") {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.eval.precision_k == 0 {
            anyhow::bail!("eval.precision_k must be greater than 0");
        }

        if self.eval.ndcg_k == 0 {
            anyhow::bail!("eval.ndcg_k must be greater than 0");
        }

        Ok(())
    }
}
