//! The `InferenceClient` trait -- the adapter interface for model backends.
//!
//! The trait is object-safe so the service can hold an
//! `Arc<dyn InferenceClient>` and tests can swap in a fake.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::BedrockError;

/// Lazily produced completion fragments. Finite and not restartable.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, BedrockError>> + Send>>;

/// A backend that streams text completions for a prompt.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Human-readable name for this client (e.g. "bedrock").
    fn name(&self) -> &str;

    /// Model used when a call does not name one.
    fn default_model_id(&self) -> &str;

    /// Open a streaming completion for `prompt`.
    ///
    /// Failing to open the stream is reported here. Failures after the
    /// stream is open arrive as `Err` items and end the stream.
    async fn invoke_stream(
        &self,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<TextStream, BedrockError>;
}

// Compile-time assertion: InferenceClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn InferenceClient) {}
};
