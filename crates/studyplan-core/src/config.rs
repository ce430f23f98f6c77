use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Sampling parameters sent with every completion request.
///
/// Field names match the Anthropic text-completion body on Bedrock, so the
/// struct is flattened straight into the request JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub max_tokens_to_sample: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            max_tokens_to_sample: 4000,
            temperature: 0.5,
            top_p: 0.9,
        }
    }
}

/// Inference configuration.
///
/// `STUDYPLAN_REGION` and `STUDYPLAN_MODEL_ID` override region and model
/// through [`InferenceConfig::with_env_overrides`].
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// AWS region hosting the Bedrock runtime endpoint.
    pub region: String,
    /// Bedrock model identifier used when a call does not name one.
    pub model_id: String,
    pub parameters: ModelParameters,
    pub retry: RetryPolicy,
    /// Trim prose around the outermost JSON object before validating.
    pub extract_json_object: bool,
    /// Sent with each request. Empty sends none.
    pub stop_sequences: Vec<String>,
}

impl InferenceConfig {
    pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-v2";
    pub const DEFAULT_REGION: &str = "us-west-2";
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_DELAY: Duration = Duration::from_secs(2);

    pub const DEFAULT_STOP_SEQUENCE: &str = "\n\nHuman:";
    pub const REGION_ENV: &str = "STUDYPLAN_REGION";
    pub const MODEL_ID_ENV: &str = "STUDYPLAN_MODEL_ID";

    /// Replace region and model with `STUDYPLAN_REGION` / `STUDYPLAN_MODEL_ID`
    /// where those are set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(region) = env::var(Self::REGION_ENV) {
            self.region = region;
        }
        if let Ok(model_id) = env::var(Self::MODEL_ID_ENV) {
            self.model_id = model_id;
        }
        self
    }

    /// Build a config from explicit region and model (useful for tests and CLI flags).
    pub fn new(region: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            model_id: model_id.into(),
            parameters: ModelParameters::default(),
            retry: RetryPolicy::new(Self::MAX_RETRIES, Self::RETRY_DELAY),
            extract_json_object: false,
            stop_sequences: vec![Self::DEFAULT_STOP_SEQUENCE.to_string()],
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REGION, Self::DEFAULT_MODEL_ID)
    }
}
