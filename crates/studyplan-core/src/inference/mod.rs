//! Remote inference clients.
//!
//! The [`InferenceClient`] trait is the seam between the learning plan
//! service and whatever produces completions. [`BedrockClient`] talks to
//! AWS Bedrock; tests substitute a scripted client.
//!
//! ```text
//! LearningPlanService
//!     |
//!     |  RetryPolicy::run(|| client.invoke_stream(prompt, model))
//!     v
//! &dyn InferenceClient --> TextStream (Result<String, BedrockError> items)
//!     |
//!     v
//! concatenated completion text
//! ```

pub mod bedrock;
pub mod trait_def;

pub use bedrock::BedrockClient;
pub use trait_def::{InferenceClient, TextStream};
