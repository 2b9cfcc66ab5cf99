//! Unified configuration for the jumpers pipeline.
//!
//! Configuration is loaded with precedence: CLI args > Env vars > Config file > Defaults
//!
//! # Example config file (jumpers.toml)
//! ```toml
//! input = "./data/data.txt"
//! output = "./output/result.txt"
//!
//! [parser]
//! header_marker = "Откуда"
//!
//! [merge]
//! strategy = "union-find"
//! signal_policy = "keep-first"
//! parallel = true
//!
//! [report]
//! annotation_threshold = 2
//! annotation = "!"
//! ```

mod defaults;

pub use defaults::*;

use crate::merge::{MergeOptions, MergeStrategy, SignalPolicy};
use crate::parser::ParserOptions;
use crate::writer::ReportOptions;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpersConfig {
    /// Tab-separated input table
    pub input: PathBuf,
    /// Report destination
    pub output: PathBuf,
    pub parser: ParserOptions,
    pub merge: MergeOptions,
    pub report: ReportOptions,
}

impl Default for JumpersConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            parser: ParserOptions::default(),
            merge: MergeOptions::default(),
            report: ReportOptions::default(),
        }
    }
}

impl JumpersConfig {
    /// Load configuration with precedence: CLI args > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - CLI overrides to apply on top
    pub fn load(
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::figment(config_path, true, overrides)
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load from defaults, an optional file and overrides, ignoring the environment.
    pub fn load_without_env(
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::figment(config_path, false, overrides)
            .extract()
            .map_err(ConfigError::from)
    }

    fn figment(config_path: Option<&Path>, with_env: bool, overrides: ConfigOverrides) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(JumpersConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with JUMPERS_ prefix
        if with_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));
        }

        // Layer 3: CLI overrides
        figment.merge(Serialized::defaults(overrides))
    }
}

/// CLI overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MergeStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_policy: Option<SignalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
