//! AWS Bedrock inference client.
//!
//! Calls `InvokeModelWithResponseStream` with an Anthropic text-completion
//! body and turns each `chunk` event into a text fragment.

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_bedrockruntime::config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::ResponseStream;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::trait_def::{InferenceClient, TextStream};
use crate::config::{InferenceConfig, ModelParameters};
use crate::error::BedrockError;

/// Request body for Anthropic text-completion models on Bedrock.
#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: String,
    #[serde(flatten)]
    parameters: ModelParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

/// One decoded `chunk` payload from the response stream.
#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    completion: Option<String>,
}

/// Wrap a prompt in the Human/Assistant turn markers.
pub fn format_prompt(prompt: &str) -> String {
    format!("\n\nHuman: {prompt}\n\nAssistant:")
}

/// Serialize the request body for `prompt`.
pub fn request_body(
    prompt: &str,
    parameters: ModelParameters,
    stop_sequences: &[String],
) -> Result<Vec<u8>, BedrockError> {
    let request = CompletionRequest {
        prompt: format_prompt(prompt),
        parameters,
        stop_sequences: (!stop_sequences.is_empty()).then_some(stop_sequences),
    };
    serde_json::to_vec(&request)
        .map_err(|e| BedrockError::invocation("failed to encode request body", e))
}

/// Extract the text fragment from one chunk payload.
///
/// A chunk without a `completion` field contributes an empty fragment.
pub fn parse_chunk(bytes: &[u8]) -> Result<String, BedrockError> {
    let chunk: CompletionChunk = serde_json::from_slice(bytes)
        .map_err(|e| BedrockError::invocation("malformed chunk in model stream", e))?;
    Ok(chunk.completion.unwrap_or_default())
}

/// Streaming client for Bedrock's runtime API.
#[derive(Clone)]
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
    region: String,
    model_id: String,
    parameters: ModelParameters,
    stop_sequences: Vec<String>,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl BedrockClient {
    /// Load AWS shared configuration for the configured region and build a
    /// client.
    ///
    /// Credentials come from the SDK's default provider chain and are
    /// resolved once here. A blank region or a chain that yields no
    /// credentials is an [`BedrockError::Initialization`] error.
    pub async fn connect(config: &InferenceConfig) -> Result<Self, BedrockError> {
        let region = config.region.trim();
        if region.is_empty() {
            return Err(BedrockError::initialization("no AWS region configured"));
        }

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let Some(provider) = sdk_config.credentials_provider() else {
            return Err(BedrockError::initialization(
                "no AWS credentials provider available",
            ));
        };
        provider.provide_credentials().await.map_err(|e| {
            BedrockError::initialization_caused_by(
                format!("no usable AWS credentials: {}", DisplayErrorContext(&e)),
                e,
            )
        })?;

        info!(region, model_id = %config.model_id, "bedrock client initialized");
        Ok(Self::from_sdk_client(
            aws_sdk_bedrockruntime::Client::new(&sdk_config),
            config,
        ))
    }

    /// Wrap an already-built SDK client.
    pub fn from_sdk_client(client: aws_sdk_bedrockruntime::Client, config: &InferenceConfig) -> Self {
        Self {
            client,
            region: config.region.clone(),
            model_id: config.model_id.clone(),
            parameters: config.parameters,
            stop_sequences: config.stop_sequences.clone(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl InferenceClient for BedrockClient {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn default_model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke_stream(
        &self,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<TextStream, BedrockError> {
        let model_id = model_id.unwrap_or(&self.model_id);
        let body = request_body(prompt, self.parameters, &self.stop_sequences)?;

        debug!(model_id, prompt_len = prompt.len(), "invoking model stream");

        let output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                BedrockError::invocation(
                    format!("request to model {model_id} failed: {}", DisplayErrorContext(&e)),
                    e,
                )
            })?;

        let mut receiver = output.body;

        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(Some(ResponseStream::Chunk(part))) => {
                        let Some(bytes) = part.bytes() else {
                            continue;
                        };
                        match parse_chunk(bytes.as_ref()) {
                            Ok(fragment) => yield Ok(fragment),
                            Err(e) => {
                                warn!("stopping model stream on malformed chunk");
                                yield Err(e);
                                break;
                            }
                        }
                    }
                    Ok(Some(other)) => {
                        debug!(event = ?other, "ignoring non-chunk stream event");
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("model stream failed");
                        yield Err(BedrockError::invocation(
                            format!("model stream interrupted: {}", DisplayErrorContext(&e)),
                            e,
                        ));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
