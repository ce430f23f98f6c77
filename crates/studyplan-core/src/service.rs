//! Learning plan service layer.
//!
//! Orchestrates one generation: prompt, streamed invocation under the retry
//! policy, concatenation, validation, assembly. Holds no per-call state, so
//! one service can serve concurrent requests.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use crate::assemble::assemble_learning_plan;
use crate::config::InferenceConfig;
use crate::error::BedrockError;
use crate::inference::{BedrockClient, InferenceClient, TextStream};
use crate::models::{LearningPlan, UserPreferences};
use crate::prompt::learning_plan_prompt;
use crate::retry::RetryPolicy;
use crate::validate::{Validation, validate_learning_plan, validate_learning_plan_lenient};

/// Per-service knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Overrides the client's default model when set.
    pub model_id: Option<String>,
    pub retry: RetryPolicy,
    /// Trim prose around the JSON object before validating.
    pub extract_json_object: bool,
}

impl ServiceOptions {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            model_id: Some(config.model_id.clone()),
            retry: config.retry,
            extract_json_object: config.extract_json_object,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            model_id: None,
            retry: RetryPolicy::default(),
            extract_json_object: false,
        }
    }
}

/// Generates learning plans through an [`InferenceClient`].
#[derive(Clone)]
pub struct LearningPlanService {
    client: Arc<dyn InferenceClient>,
    options: ServiceOptions,
}

impl std::fmt::Debug for LearningPlanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningPlanService")
            .field("client", &self.client.name())
            .field("options", &self.options)
            .finish()
    }
}

impl LearningPlanService {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self::with_options(client, ServiceOptions::default())
    }

    pub fn with_options(client: Arc<dyn InferenceClient>, options: ServiceOptions) -> Self {
        Self { client, options }
    }

    /// Build a service backed by a [`BedrockClient`] for `config`.
    pub async fn connect(config: &InferenceConfig) -> Result<Self, BedrockError> {
        let client = BedrockClient::connect(config).await?;
        Ok(Self::with_options(
            Arc::new(client),
            ServiceOptions::from_config(config),
        ))
    }

    /// Generate a learning plan for `preferences`.
    ///
    /// Only opening the stream is retried. An error from the stream after it
    /// opened is returned as-is. Invalid output is never retried.
    pub async fn generate_plan(
        &self,
        preferences: &UserPreferences,
    ) -> Result<LearningPlan, BedrockError> {
        let prompt = learning_plan_prompt(preferences);
        let model_id = self.options.model_id.as_deref();

        info!(
            client = self.client.name(),
            model_id = model_id.unwrap_or(self.client.default_model_id()),
            topic = %preferences.topic,
            "generating learning plan"
        );

        let stream = self
            .options
            .retry
            .run(|| self.client.invoke_stream(&prompt, model_id))
            .await?;

        let response = collect_response(stream).await?;

        let validation = if self.options.extract_json_object {
            validate_learning_plan_lenient(&response)
        } else {
            validate_learning_plan(&response)
        };

        let document = match validation {
            Validation::Valid(document) => document,
            Validation::Invalid(reason) => {
                warn!(response_len = response.len(), "model returned an invalid plan");
                return Err(BedrockError::invalid_response(
                    format!("invalid response format from Bedrock: {reason}"),
                    response,
                ));
            }
        };

        let plan = assemble_learning_plan(&document).map_err(|e| e.with_response(response))?;

        info!(topic = %plan.topic, weeks = plan.weeks.len(), "learning plan generated");
        Ok(plan)
    }
}

/// Drain `stream`, concatenating every fragment.
async fn collect_response(mut stream: TextStream) -> Result<String, BedrockError> {
    let mut response = String::new();
    while let Some(fragment) = stream.next().await {
        match fragment {
            Ok(text) => response.push_str(&text),
            Err(e) => {
                warn!(received = response.len(), "model stream failed after partial output");
                return Err(e);
            }
        }
    }
    Ok(response)
}
