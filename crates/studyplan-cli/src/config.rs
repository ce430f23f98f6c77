//! Configuration file management for studyplan.
//!
//! Provides a TOML-based config file at `~/.config/studyplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyplan_core::InferenceConfig;
use studyplan_core::config::ModelParameters;
use studyplan_core::retry::RetryPolicy;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub bedrock: BedrockSection,
    pub retry: RetrySection,
    pub model: ModelSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BedrockSection {
    pub region: String,
    pub model_id: String,
    /// Tolerate prose around the JSON object in model output.
    pub extract_json_object: bool,
}

impl Default for BedrockSection {
    fn default() -> Self {
        Self {
            region: InferenceConfig::DEFAULT_REGION.to_string(),
            model_id: InferenceConfig::DEFAULT_MODEL_ID.to_string(),
            extract_json_object: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_retries: u32,
    /// Backoff base in seconds.
    pub delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: InferenceConfig::MAX_RETRIES,
            delay_secs: InferenceConfig::RETRY_DELAY.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    #[serde(flatten)]
    pub parameters: ModelParameters,
    /// Stop sequences sent with each request. Empty sends none.
    pub stop_sequences: Vec<String>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            parameters: ModelParameters::default(),
            stop_sequences: vec![InferenceConfig::DEFAULT_STOP_SEQUENCE.to_string()],
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/studyplan` or
/// `~/.config/studyplan`, on macOS too.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyplan")
}

/// Return the path to the studyplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Load the config file if one exists. A file that exists but does not
/// parse is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file to `path`, creating parent dirs as
/// needed.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StudyplanConfig {
    pub inference: InferenceConfig,
}

impl StudyplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Region: `cli_region` > `STUDYPLAN_REGION` > `bedrock.region` > `InferenceConfig::DEFAULT_REGION`
    /// - Model: `cli_model_id` > `STUDYPLAN_MODEL_ID` > `bedrock.model_id` > `InferenceConfig::DEFAULT_MODEL_ID`
    /// - Retry, sampling parameters, stop sequences and lenient parsing come
    ///   from the file only.
    pub fn resolve(cli_region: Option<&str>, cli_model_id: Option<&str>) -> Result<Self> {
        let file_config = load_config()?;
        Ok(Self::resolve_with(file_config, cli_region, cli_model_id))
    }

    /// Like [`StudyplanConfig::resolve`], with an already-loaded config file.
    pub fn resolve_with(
        file_config: Option<ConfigFile>,
        cli_region: Option<&str>,
        cli_model_id: Option<&str>,
    ) -> Self {
        let file = file_config.unwrap_or_default();

        let mut inference =
            InferenceConfig::new(file.bedrock.region, file.bedrock.model_id).with_env_overrides();
        if let Some(region) = cli_region {
            inference.region = region.to_string();
        }
        if let Some(model_id) = cli_model_id {
            inference.model_id = model_id.to_string();
        }

        inference.parameters = file.model.parameters;
        inference.stop_sequences = file.model.stop_sequences;
        inference.retry = RetryPolicy::new(
            file.retry.max_retries,
            Duration::from_secs(file.retry.delay_secs),
        );
        inference.extract_json_object = file.bedrock.extract_json_object;

        Self { inference }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
