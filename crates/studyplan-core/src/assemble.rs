//! Map a validated JSON document onto the [`LearningPlan`] tree.
//!
//! The model is only asked to follow the schema, so nothing here trusts the
//! document. Every missing key or wrong type becomes a
//! [`BedrockError::InvalidResponse`] naming the JSON path that failed.
//!
//! List entries under `resources`, `activities` and `milestones` may be
//! either a bare string (the entity's primary field) or an object mapped
//! field by field. Keys an entity does not know are ignored.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::BedrockError;
use crate::models::{Activity, LearningPlan, Milestone, Resource, Week};

/// A list entry, decoded by the runtime shape of its JSON value.
#[derive(Debug)]
enum Entry<'a> {
    Text(&'a str),
    Object(&'a Value),
}

impl<'a> Entry<'a> {
    fn classify(value: &'a Value, path: &str) -> Result<Self, BedrockError> {
        match value {
            Value::String(s) => Ok(Self::Text(s)),
            Value::Object(_) => Ok(Self::Object(value)),
            other => Err(invalid(
                path,
                format!("expected a string or an object, found {}", json_type(other)),
            )),
        }
    }
}

/// Entities that can be built from a bare string or a JSON object.
trait FromEntry: DeserializeOwned {
    /// Name of the field a bare string maps onto.
    const PRIMARY: &'static str;
    /// Keys accepted in object form.
    const FIELDS: &'static [&'static str];

    fn from_text(text: &str) -> Self;
}

impl FromEntry for Resource {
    const PRIMARY: &'static str = "name";
    const FIELDS: &'static [&'static str] = &["name", "url", "type"];

    fn from_text(text: &str) -> Self {
        Resource::named(text)
    }
}

impl FromEntry for Activity {
    const PRIMARY: &'static str = "description";
    const FIELDS: &'static [&'static str] = &["description", "estimated_duration"];

    fn from_text(text: &str) -> Self {
        Activity::described(text)
    }
}

impl FromEntry for Milestone {
    const PRIMARY: &'static str = "description";
    const FIELDS: &'static [&'static str] = &["description", "completion_criteria"];

    fn from_text(text: &str) -> Self {
        Milestone::described(text)
    }
}

fn invalid(path: &str, message: impl AsRef<str>) -> BedrockError {
    BedrockError::invalid_response(
        format!(
            "error converting response to learning plan at {path}: {}",
            message.as_ref()
        ),
        "",
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn require<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, BedrockError> {
    object
        .get(key)
        .ok_or_else(|| invalid(path, format!("missing key {key:?}")))
}

fn require_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, BedrockError> {
    let value = require(object, key, path)?;
    value.as_str().ok_or_else(|| {
        invalid(
            &format!("{path}.{key}"),
            format!("expected a string, found {}", json_type(value)),
        )
    })
}

fn require_array<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a [Value], BedrockError> {
    let value = require(object, key, path)?;
    value.as_array().map(Vec::as_slice).ok_or_else(|| {
        invalid(
            &format!("{path}.{key}"),
            format!("expected an array, found {}", json_type(value)),
        )
    })
}

fn entries<T: FromEntry>(
    week: &Map<String, Value>,
    key: &str,
    week_path: &str,
) -> Result<Vec<T>, BedrockError> {
    let items = require_array(week, key, week_path)?;
    let mut out = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let path = format!("{week_path}.{key}[{i}]");
        let entity = match Entry::classify(item, &path)? {
            Entry::Text(text) => T::from_text(text),
            Entry::Object(value) => {
                if let Some(object) = value.as_object() {
                    if !object.contains_key(T::PRIMARY) {
                        return Err(invalid(&path, format!("missing key {:?}", T::PRIMARY)));
                    }
                    let extra: Vec<&str> = object
                        .keys()
                        .map(String::as_str)
                        .filter(|k| !T::FIELDS.contains(k))
                        .collect();
                    if !extra.is_empty() {
                        debug!(path = %path, keys = ?extra, "ignoring unknown entry keys");
                    }
                }
                serde_json::from_value::<T>(value.clone()).map_err(|e| BedrockError::InvalidResponse {
                    message: format!("error converting response to learning plan at {path}: {e}"),
                    response: String::new(),
                    source: Some(Box::new(e)),
                })?
            }
        };
        out.push(entity);
    }

    Ok(out)
}

fn week_number(week: &Map<String, Value>, path: &str) -> Result<u32, BedrockError> {
    let value = require(week, "week", path)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            invalid(
                &format!("{path}.week"),
                format!("expected a positive integer, found {value}"),
            )
        })
}

fn assemble_week(value: &Value, path: &str) -> Result<Week, BedrockError> {
    let week = value
        .as_object()
        .ok_or_else(|| invalid(path, format!("expected an object, found {}", json_type(value))))?;

    Ok(Week {
        number: week_number(week, path)?,
        focus: require_str(week, "focus", path)?.to_string(),
        resources: entries(week, "resources", path)?,
        activities: entries(week, "activities", path)?,
        milestones: entries(week, "milestones", path)?,
    })
}

/// Log when week numbers repeat or do not run 1..=n. Not an error.
fn check_week_numbering(weeks: &[Week]) {
    let mut seen = BTreeSet::new();
    let duplicates: Vec<u32> = weeks
        .iter()
        .filter(|w| !seen.insert(w.number))
        .map(|w| w.number)
        .collect();
    if !duplicates.is_empty() {
        warn!(?duplicates, "learning plan repeats week numbers");
    }

    let contiguous = seen.iter().copied().eq(1..=seen.len() as u32);
    if !contiguous {
        warn!(weeks = ?seen, "learning plan week numbers are not contiguous from 1");
    }
}

/// Build a [`LearningPlan`] from a document already known to carry the
/// `topic`, `overview` and `weeks` keys.
pub fn assemble_learning_plan(document: &Value) -> Result<LearningPlan, BedrockError> {
    let root = document
        .as_object()
        .ok_or_else(|| invalid("$", format!("expected an object, found {}", json_type(document))))?;

    let topic = require_str(root, "topic", "$")?;
    let overview = require_str(root, "overview", "$")?;
    let raw_weeks = require_array(root, "weeks", "$")?;

    let weeks = raw_weeks
        .iter()
        .enumerate()
        .map(|(i, w)| assemble_week(w, &format!("weeks[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    check_week_numbering(&weeks);

    Ok(LearningPlan::new(topic, overview, weeks))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc_with_week(week: Value) -> Value {
        json!({ "topic": "Go", "overview": "Learn Go", "weeks": [week] })
    }

    fn week(resources: Value) -> Value {
        json!({
            "week": 1,
            "focus": "Basics",
            "resources": resources,
            "activities": ["Install the toolchain"],
            "milestones": ["Hello world runs"]
        })
    }

    fn message(err: BedrockError) -> String {
        assert_eq!(err.kind(), "invalid_response");
        err.to_string()
    }

    #[test]
    fn bare_string_resource_sets_only_the_name() {
        let plan = assemble_learning_plan(&doc_with_week(week(json!(["Book A"])))).unwrap();
        let r = &plan.weeks[0].resources[0];
        assert_eq!(r.name, "Book A");
        assert!(r.url.is_none());
        assert!(r.kind.is_none());
    }

    #[test]
    fn object_resource_is_mapped_field_by_field() {
        let plan = assemble_learning_plan(&doc_with_week(week(
            json!([{"name": "Book B", "url": "http://x"}]),
        )))
        .unwrap();
        let r = &plan.weeks[0].resources[0];
        assert_eq!(r.name, "Book B");
        assert_eq!(r.url.as_deref(), Some("http://x"));
        assert!(r.kind.is_none());
    }

    #[test]
    fn mixed_entry_forms_in_one_list() {
        let doc = doc_with_week(json!({
            "week": 1,
            "focus": "Basics",
            "resources": [],
            "activities": ["Read", {"description": "Build a CLI", "estimated_duration": 3}],
            "milestones": [{"description": "Ship it", "completion_criteria": "binary on PATH"}]
        }));
        let plan = assemble_learning_plan(&doc).unwrap();
        let week = &plan.weeks[0];
        assert_eq!(week.activities[0], Activity::described("Read"));
        assert_eq!(week.activities[1].estimated_duration, Some(3));
        assert_eq!(
            week.milestones[0].completion_criteria.as_deref(),
            Some("binary on PATH")
        );
    }

    #[test]
    fn unknown_entry_keys_are_ignored() {
        let plan = assemble_learning_plan(&doc_with_week(week(
            json!([{"name": "Book C", "author": "someone"}]),
        )))
        .unwrap();
        assert_eq!(plan.weeks[0].resources[0].name, "Book C");
    }

    #[test]
    fn rejects_numeric_entry_with_path() {
        let err = assemble_learning_plan(&doc_with_week(week(json!(["ok", 42])))).unwrap_err();
        let msg = message(err);
        assert!(msg.contains("weeks[0].resources[1]"), "got: {msg}");
    }

    #[test]
    fn rejects_object_entry_without_primary_field() {
        let err = assemble_learning_plan(&doc_with_week(week(json!([{"url": "http://x"}]))))
            .unwrap_err();
        let msg = message(err);
        assert!(msg.contains("missing key \"name\""), "got: {msg}");
    }

    #[test]
    fn rejects_mistyped_entry_field() {
        let doc = doc_with_week(json!({
            "week": 1,
            "focus": "Basics",
            "resources": [],
            "activities": [{"description": "Read", "estimated_duration": "two hours"}],
            "milestones": []
        }));
        let err = assemble_learning_plan(&doc).unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
        assert!(message(err).contains("weeks[0].activities[0]"));
    }

    #[test]
    fn rejects_missing_week_keys() {
        for key in ["week", "focus", "resources", "activities", "milestones"] {
            let mut w = week(json!([]));
            w.as_object_mut().unwrap().remove(key);
            let err = assemble_learning_plan(&doc_with_week(w)).unwrap_err();
            let msg = message(err);
            assert!(msg.contains(&format!("missing key {key:?}")), "got: {msg}");
        }
    }

    #[test]
    fn rejects_non_positive_week_number() {
        for number in [json!(0), json!(-1), json!("1"), json!(1.5)] {
            let mut w = week(json!([]));
            w["week"] = number.clone();
            let err = assemble_learning_plan(&doc_with_week(w)).unwrap_err();
            assert!(message(err).contains("weeks[0].week"), "number {number}");
        }
    }

    #[test]
    fn rejects_weeks_that_is_not_an_array() {
        let err = assemble_learning_plan(&json!({"topic": "t", "overview": "o", "weeks": {}}))
            .unwrap_err();
        assert!(message(err).contains("$.weeks"));
    }

    #[test]
    fn empty_weeks_is_a_valid_plan() {
        let plan = assemble_learning_plan(&json!({"topic": "t", "overview": "o", "weeks": []})).unwrap();
        assert!(plan.weeks.is_empty());
    }

    #[test]
    fn week_numbers_are_kept_as_given() {
        let doc = json!({
            "topic": "t",
            "overview": "o",
            "weeks": [
                {"week": 2, "focus": "b", "resources": [], "activities": [], "milestones": []},
                {"week": 2, "focus": "c", "resources": [], "activities": [], "milestones": []},
                {"week": 7, "focus": "d", "resources": [], "activities": [], "milestones": []}
            ]
        });
        let plan = assemble_learning_plan(&doc).unwrap();
        let numbers: Vec<u32> = plan.weeks.iter().map(|w| w.number).collect();
        assert_eq!(numbers, vec![2, 2, 7]);
    }
}
