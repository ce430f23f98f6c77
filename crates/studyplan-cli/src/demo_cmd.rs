use std::fmt::Write;

use anyhow::{Context, Result};

use studyplan_core::{LearningPlan, LearningPlanService, UserPreferences};

/// Preferences used by `studyplan demo`.
pub fn demo_preferences() -> Result<UserPreferences> {
    UserPreferences::new(
        "Python Programming",
        "beginner",
        10,
        "video tutorials, hands-on projects",
    )
    .context("invalid demo preferences")
}

/// Human-readable summary: topic, overview, then one line per week.
pub fn render_summary(plan: &LearningPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated Learning Plan:");
    let _ = writeln!(out, "Topic: {}", plan.topic);
    let _ = writeln!(out, "Overview: {}", plan.overview);
    for week in &plan.weeks {
        let _ = writeln!(out);
        let _ = writeln!(out, "Week {}:", week.number);
        let _ = writeln!(out, "Focus: {}", week.focus);
    }
    out
}

/// Generate a plan for the fixed demo preferences and print its summary.
pub async fn run_demo(service: &LearningPlanService) -> Result<()> {
    let preferences = demo_preferences()?;
    let plan = service
        .generate_plan(&preferences)
        .await
        .context("failed to generate demo learning plan")?;
    print!("{}", render_summary(&plan));
    Ok(())
}
