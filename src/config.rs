use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tracker::{Container, DEFAULT_PREFIX, TrackerOptions};

const CONFIG_SCHEMA: &str = include_str!("../tracklog.schema.json");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Selector for the root container; the body when absent.
    #[serde(default)]
    pub container: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            container: None,
        }
    }
}

impl From<&TrackerConfig> for TrackerOptions {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            container: config
                .container
                .as_deref()
                .map(Container::from)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for JSON log files; stderr only when absent.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    /// Reads a JSON5 config file. A relative `logging.dir` is resolved against
    /// the file's directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config = Self::parse(&config_content)
            .with_context(|| format!("failed to load {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(dir) = config.logging.dir.as_mut()
            && !dir.is_absolute()
        {
            *dir = config_base.join(&*dir);
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config_value: Value = json5::from_str(text).context("failed to parse config")?;
        validate_against_schema(&config_value)?;
        serde_json::from_value(config_value).context("failed to deserialize tracker config")
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions::from(&self.tracker)
    }
}

fn validate_against_schema(config_value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(CONFIG_SCHEMA).context("failed to parse embedded config schema")?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
