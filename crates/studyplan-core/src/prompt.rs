//! Prompt construction for learning plan generation.
//!
//! Pure string building, no I/O. User-supplied text is embedded as JSON
//! string literals so quotes, braces or newlines in the input cannot bleed
//! into the JSON shape the model is asked to follow.

use crate::models::UserPreferences;

/// Output contract included verbatim in every prompt.
const RESPONSE_SCHEMA: &str = r#"Return ONLY a JSON object with the following structure:
{
    "topic": "Main topic",
    "overview": "Brief overview",
    "weeks": [
        {
            "week": 1,
            "focus": "Focus area",
            "resources": ["Resource 1", "Resource 2"],
            "activities": ["Activity 1", "Activity 2"],
            "milestones": ["Milestone 1"]
        }
    ]
}

Rules:
- Use exactly the top-level keys "topic", "overview" and "weeks".
- "week" is an integer starting at 1.
- "resources", "activities" and "milestones" are arrays of plain strings.
- Do not wrap the JSON in markdown and do not add any text before or after it.
"#;

/// Render a value as a JSON string literal (quoted and escaped).
fn quoted(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Build the prompt asking the model for a learning plan.
pub fn learning_plan_prompt(preferences: &UserPreferences) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Generate a personalized learning plan.\n\n");
    prompt.push_str("The learner's request, with each value given as a JSON string:\n");
    prompt.push_str(&format!("- Topic: {}\n", quoted(&preferences.topic)));
    prompt.push_str(&format!(
        "- Knowledge level: {}\n",
        quoted(&preferences.knowledge_level)
    ));
    prompt.push_str(&format!(
        "- Hours available per week: {}\n",
        preferences.time_available
    ));
    prompt.push_str(&format!(
        "- Learning preferences: {}\n\n",
        quoted(&preferences.learning_preferences)
    ));

    prompt.push_str(RESPONSE_SCHEMA);

    prompt
}
