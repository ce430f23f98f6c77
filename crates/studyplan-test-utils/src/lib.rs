//! Shared test utilities for studyplan tests.
//!
//! Provides [`ScriptedClient`], an in-memory [`InferenceClient`] that plays
//! back a fixed sequence of outcomes, plus sample requests and model
//! responses.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use studyplan_core::BedrockError;
use studyplan_core::inference::{InferenceClient, TextStream};
use studyplan_core::models::UserPreferences;

/// One scripted outcome of `invoke_stream`.
#[derive(Debug, Clone)]
pub enum Script {
    /// Opening the stream fails with a model-invocation error.
    Fail(String),
    /// The stream yields these fragments and ends.
    Chunks(Vec<String>),
    /// The stream yields these fragments, then a model-invocation error.
    ChunksThenFail(Vec<String>, String),
}

/// Inference client that replays [`Script`]s in order.
///
/// Once the scripts run out every call fails to open a stream.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    model_ids: Mutex<Vec<Option<String>>>,
}

fn io_error(message: &str) -> BedrockError {
    BedrockError::invocation(message.to_string(), std::io::Error::other(message.to_string()))
}

impl ScriptedClient {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            ..Self::default()
        }
    }

    /// A client whose single call streams `text` in small fragments.
    pub fn replying(text: &str) -> Self {
        Self::new([Script::Chunks(chunked(text, 16))])
    }

    /// Number of `invoke_stream` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Model ids received, in call order.
    pub fn model_ids(&self) -> Vec<Option<String>> {
        self.model_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model_id(&self) -> &str {
        "scripted-model"
    }

    async fn invoke_stream(
        &self,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<TextStream, BedrockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.model_ids
            .lock()
            .unwrap()
            .push(model_id.map(str::to_string));

        let next = self.scripts.lock().unwrap().pop_front();
        let items: Vec<Result<String, BedrockError>> = match next {
            None => return Err(io_error("no scripted response left")),
            Some(Script::Fail(message)) => return Err(io_error(&message)),
            Some(Script::Chunks(chunks)) => chunks.into_iter().map(Ok).collect(),
            Some(Script::ChunksThenFail(chunks, message)) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(io_error(&message))))
                .collect(),
        };

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Split `text` into fragments of at most `size` characters.
pub fn chunked(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Preferences used by the end-to-end scenarios.
pub fn go_preferences() -> UserPreferences {
    UserPreferences::new("Go", "beginner", 5, "reading").unwrap()
}

/// The same preferences as an untyped request mapping.
pub fn go_request() -> Value {
    json!({
        "topic": "Go",
        "knowledge_level": "beginner",
        "time_available": 5,
        "learning_preferences": "reading"
    })
}

/// A valid two-week plan, mixing bare-string and object entries.
pub fn two_week_plan_json() -> String {
    json!({
        "topic": "Go",
        "overview": "A two week introduction to Go for readers.",
        "weeks": [
            {
                "week": 1,
                "focus": "Syntax and tooling",
                "resources": [
                    "The Go Programming Language",
                    {"name": "A Tour of Go", "url": "https://go.dev/tour", "type": "website"}
                ],
                "activities": ["Install Go", {"description": "Finish the tour", "estimated_duration": 3}],
                "milestones": ["Write and run hello world"]
            },
            {
                "week": 2,
                "focus": "Concurrency",
                "resources": ["Concurrency in Go"],
                "activities": ["Build a worker pool"],
                "milestones": [{"description": "Worker pool passes its tests", "completion_criteria": "go test ./... is green"}]
            }
        ]
    })
    .to_string()
}

/// Text that is not JSON at all.
pub const MALFORMED_RESPONSE: &str = " {\"topic\": \"Go\", \"overview\": \"cut off mid";
