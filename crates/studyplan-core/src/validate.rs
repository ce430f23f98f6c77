//! Shape check on the raw model response.
//!
//! Only the presence of the top-level keys is checked here. Per-week
//! structure is left to [`crate::assemble`], which reports its own errors.
//! Validation never fails with an error: malformed input is simply
//! [`Validation::Invalid`].

use std::fmt;

use serde_json::Value;

/// Keys every learning plan document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["topic", "overview", "weeks"];

/// Outcome of validating a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Parsed document with all required keys present.
    Valid(Value),
    Invalid(InvalidReason),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Why a response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The text did not parse as JSON.
    NotJson(String),
    /// The JSON was valid but not an object.
    NotAnObject,
    MissingKeys(Vec<&'static str>),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "response is not valid JSON: {e}"),
            Self::NotAnObject => write!(f, "response JSON is not an object"),
            Self::MissingKeys(keys) => {
                write!(f, "response is missing required keys: {}", keys.join(", "))
            }
        }
    }
}

/// Parse `response` and check it carries every key in [`REQUIRED_KEYS`].
pub fn validate_learning_plan(response: &str) -> Validation {
    let value: Value = match serde_json::from_str(response) {
        Ok(v) => v,
        Err(e) => return Validation::Invalid(InvalidReason::NotJson(e.to_string())),
    };

    let Some(object) = value.as_object() else {
        return Validation::Invalid(InvalidReason::NotAnObject);
    };

    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Validation::Valid(value)
    } else {
        Validation::Invalid(InvalidReason::MissingKeys(missing))
    }
}

/// Like [`validate_learning_plan`], but first drops any text outside the
/// outermost `{ ... }` span.
pub fn validate_learning_plan_lenient(response: &str) -> Validation {
    match extract_json_object(response) {
        Some(candidate) => validate_learning_plan(candidate),
        None => validate_learning_plan(response),
    }
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_is_valid() {
        let v = validate_learning_plan(r#"{"topic":"t","overview":"o","weeks":[]}"#);
        assert!(v.is_valid());
        let Validation::Valid(doc) = v else {
            unreachable!()
        };
        assert_eq!(doc["topic"], "t");
    }

    #[test]
    fn missing_overview_is_invalid() {
        let v = validate_learning_plan(r#"{"topic":"t","weeks":[]}"#);
        assert_eq!(
            v,
            Validation::Invalid(InvalidReason::MissingKeys(vec!["overview"]))
        );
    }

    #[test]
    fn plain_text_is_invalid_not_an_error() {
        let v = validate_learning_plan("not json");
        assert!(matches!(v, Validation::Invalid(InvalidReason::NotJson(_))));
    }

    #[test]
    fn non_object_json_is_invalid() {
        assert_eq!(
            validate_learning_plan(r#"["topic","overview","weeks"]"#),
            Validation::Invalid(InvalidReason::NotAnObject)
        );
        assert!(!validate_learning_plan("null").is_valid());
    }

    #[test]
    fn leading_whitespace_is_fine() {
        // Completions usually start with a space.
        assert!(validate_learning_plan(" {\"topic\":\"t\",\"overview\":\"o\",\"weeks\":[]}\n").is_valid());
    }

    #[test]
    fn lenient_mode_strips_surrounding_prose() {
        let text = "Here is your plan:\n```json\n{\"topic\":\"t\",\"overview\":\"o\",\"weeks\":[]}\n```";
        assert!(!validate_learning_plan(text).is_valid());
        assert!(validate_learning_plan_lenient(text).is_valid());
    }

    #[test]
    fn extract_requires_ordered_braces() {
        assert_eq!(extract_json_object("a {b} c"), Some("{b}"));
        assert_eq!(extract_json_object("} {"), None);
        assert_eq!(extract_json_object("no braces"), None);
    }

    #[test]
    fn reason_display_lists_keys() {
        let reason = InvalidReason::MissingKeys(vec!["overview", "weeks"]);
        assert_eq!(
            reason.to_string(),
            "response is missing required keys: overview, weeks"
        );
    }
}
