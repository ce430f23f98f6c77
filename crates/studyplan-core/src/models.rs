//! Domain types for learning plans.
//!
//! Everything here is a plain value built once from parsed model output and
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the learner asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub topic: String,
    pub knowledge_level: String,
    /// Hours available per week.
    pub time_available: u32,
    pub learning_preferences: String,
}

/// Reasons a set of preferences is rejected before any model call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    #[error("field {field:?} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("time_available must be a positive number of hours")]
    NoTimeAvailable,
}

impl UserPreferences {
    /// Build preferences, rejecting an empty topic or zero weekly hours.
    pub fn new(
        topic: impl Into<String>,
        knowledge_level: impl Into<String>,
        time_available: u32,
        learning_preferences: impl Into<String>,
    ) -> Result<Self, PreferencesError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(PreferencesError::EmptyTopic);
        }
        if time_available == 0 {
            return Err(PreferencesError::NoTimeAvailable);
        }
        Ok(Self {
            topic,
            knowledge_level: knowledge_level.into(),
            time_available,
            learning_preferences: learning_preferences.into(),
        })
    }

    /// Read preferences out of an untyped JSON mapping with the keys
    /// `topic`, `knowledge_level`, `time_available`, `learning_preferences`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PreferencesError> {
        fn text<'a>(
            value: &'a serde_json::Value,
            field: &'static str,
        ) -> Result<&'a str, PreferencesError> {
            match value.get(field) {
                None | Some(serde_json::Value::Null) => Err(PreferencesError::MissingField(field)),
                Some(v) => v.as_str().ok_or(PreferencesError::WrongType {
                    field,
                    expected: "a string",
                }),
            }
        }

        let topic = text(value, "topic")?;
        let knowledge_level = text(value, "knowledge_level")?;
        let learning_preferences = text(value, "learning_preferences")?;

        let time_available = match value.get("time_available") {
            None | Some(serde_json::Value::Null) => {
                return Err(PreferencesError::MissingField("time_available"));
            }
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(PreferencesError::WrongType {
                    field: "time_available",
                    expected: "a non-negative integer",
                })?,
        };

        Self::new(topic, knowledge_level, time_available, learning_preferences)
    }
}

/// A book, course, video or other material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl Resource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            kind: None,
        }
    }
}

/// Something the learner does during a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub description: String,
    /// Expected effort, in hours.
    #[serde(default)]
    pub estimated_duration: Option<u32>,
}

impl Activity {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            estimated_duration: None,
        }
    }
}

/// A checkpoint that marks progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub description: String,
    #[serde(default)]
    pub completion_criteria: Option<String>,
}

impl Milestone {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completion_criteria: None,
        }
    }
}

/// One week of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    #[serde(rename = "week")]
    pub number: u32,
    pub focus: String,
    pub resources: Vec<Resource>,
    pub activities: Vec<Activity>,
    pub milestones: Vec<Milestone>,
}

/// A complete generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub topic: String,
    pub overview: String,
    pub weeks: Vec<Week>,
    pub created_at: DateTime<Utc>,
}

impl LearningPlan {
    /// Build a plan stamped with the current time.
    pub fn new(topic: impl Into<String>, overview: impl Into<String>, weeks: Vec<Week>) -> Self {
        Self {
            topic: topic.into(),
            overview: overview.into(),
            weeks,
            created_at: Utc::now(),
        }
    }
}
