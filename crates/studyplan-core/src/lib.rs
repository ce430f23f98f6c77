//! Learning plan generation on top of AWS Bedrock.
//!
//! The pipeline is linear: build a prompt from [`models::UserPreferences`],
//! stream a completion from an [`inference::InferenceClient`] (retried with
//! [`retry::RetryPolicy`]), validate the concatenated text, then assemble it
//! into a [`models::LearningPlan`].

pub mod assemble;
pub mod config;
pub mod entry;
pub mod error;
pub mod inference;
pub mod models;
pub mod prompt;
pub mod retry;
pub mod service;
#[cfg(test)]
mod test_util;
pub mod validate;

pub use config::InferenceConfig;
pub use entry::{EntryError, create_learning_plan};
pub use error::BedrockError;
pub use models::{Activity, LearningPlan, Milestone, Resource, UserPreferences, Week};
pub use service::{LearningPlanService, ServiceOptions};
