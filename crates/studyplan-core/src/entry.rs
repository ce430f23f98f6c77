//! Mapping-in, mapping-out entry point.
//!
//! Takes an untyped request mapping, runs the service, and returns the plan
//! as a plain JSON mapping. Failures are logged once here, through the
//! dispatcher the caller passes in, and then returned unchanged.

use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, error};

use crate::error::BedrockError;
use crate::models::{LearningPlan, PreferencesError, UserPreferences};
use crate::service::LearningPlanService;

/// Errors surfaced by [`create_learning_plan`].
#[derive(Debug, Error)]
pub enum EntryError {
    /// The request mapping did not describe valid preferences.
    #[error("invalid learning plan request: {0}")]
    InvalidInput(#[from] PreferencesError),

    #[error(transparent)]
    Bedrock(#[from] BedrockError),
}

/// Render a plan as the response mapping: `topic`, `overview`, `weeks`.
///
/// Absent optional fields are emitted as `null`. The creation timestamp is
/// not part of the mapping.
pub fn plan_to_value(plan: &LearningPlan) -> Value {
    json!({
        "topic": plan.topic,
        "overview": plan.overview,
        "weeks": plan.weeks,
    })
}

/// Build preferences from `input`, generate a plan, and return it as a
/// mapping.
pub async fn create_learning_plan(
    service: &LearningPlanService,
    input: &Value,
    log: &Dispatch,
) -> Result<Value, EntryError> {
    async {
        let result = generate(service, input).await;
        match &result {
            Ok(_) => {}
            Err(EntryError::Bedrock(e)) => {
                error!(kind = e.kind(), "error generating learning plan: {e}");
            }
            Err(e) => {
                error!("unexpected error: {e}");
            }
        }
        result
    }
    .with_subscriber(log.clone())
    .await
}

async fn generate(service: &LearningPlanService, input: &Value) -> Result<Value, EntryError> {
    let preferences = UserPreferences::from_value(input)?;
    let plan = service.generate_plan(&preferences).await?;
    Ok(plan_to_value(&plan))
}
