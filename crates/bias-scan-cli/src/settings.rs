use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bias_scan_core::DEFAULT_HISTORY_CAPACITY;
use config::{Config, Environment, File};
use serde::Deserialize;

/// CLI settings merged from an optional config file and `BIAS_SCAN_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pattern table to load instead of the built-in one.
    pub patterns_file: Option<PathBuf>,
    pub history_file: PathBuf,
    pub history_capacity: usize,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            patterns_file: None,
            history_file: PathBuf::from(".bias-scan/history.json"),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            color: true,
        }
    }
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "BIAS_SCAN";

    /// Load settings; the environment overrides the file.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(Self::ENV_PREFIX));
        let config = builder.build().with_context(|| match config_path {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to load config from environment".to_string(),
        })?;
        config
            .try_deserialize()
            .context("invalid bias-scan configuration")
    }
}
