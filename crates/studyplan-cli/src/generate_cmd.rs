use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use studyplan_core::{LearningPlanService, create_learning_plan};

/// Where the request mapping for `studyplan generate` comes from.
pub enum RequestSource<'a> {
    /// A JSON file holding the request mapping.
    File(&'a Path),
    /// Individual command-line flags.
    Flags {
        topic: &'a str,
        level: &'a str,
        hours: u32,
        preferences: &'a str,
    },
}

/// Build the entry-point request mapping.
pub fn build_request(source: RequestSource<'_>) -> Result<Value> {
    match source {
        RequestSource::File(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path.display()))?;
            let value: Value = serde_json::from_str(&contents)
                .with_context(|| format!("request file {} is not valid JSON", path.display()))?;
            if !value.is_object() {
                bail!("request file {} must hold a JSON object", path.display());
            }
            Ok(value)
        }
        RequestSource::Flags {
            topic,
            level,
            hours,
            preferences,
        } => Ok(json!({
            "topic": topic,
            "knowledge_level": level,
            "time_available": hours,
            "learning_preferences": preferences,
        })),
    }
}

/// Generate a plan and write it as pretty JSON to `output` or stdout.
pub async fn run_generate(
    service: &LearningPlanService,
    request: &Value,
    output: Option<&Path>,
) -> Result<()> {
    let log = tracing::Dispatch::default();
    let plan = create_learning_plan(service, request, &log)
        .await
        .context("failed to generate learning plan")?;

    let rendered = serde_json::to_string_pretty(&plan)?;

    let mut writer: Box<dyn Write> = if let Some(path) = output {
        Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create output file: {}", path.display()))?,
        )
    } else {
        Box::new(std::io::stdout().lock())
    };
    writeln!(writer, "{rendered}")?;

    if let Some(path) = output {
        let weeks = plan["weeks"].as_array().map_or(0, Vec::len);
        println!("Wrote {weeks}-week plan to {}", path.display());
    }

    Ok(())
}
