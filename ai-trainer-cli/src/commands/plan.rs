use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::{DayWorkout, WorkoutPlan};
use crate::storage::Storage;
use crate::workout::estimate_minutes;

/// Accepted import shapes: a full plan object or a bare list of days
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanFile {
    Plan(WorkoutPlan),
    Days(Vec<DayWorkout>),
}

pub fn parse_plan(contents: &str, name: Option<String>) -> Result<WorkoutPlan> {
    let mut plan = match serde_json::from_str::<PlanFile>(contents).context("Invalid plan JSON")? {
        PlanFile::Plan(plan) => plan,
        PlanFile::Days(days) => WorkoutPlan::new(String::new(), days),
    };

    if plan.days.is_empty() {
        bail!("Plan has no days");
    }
    if let Some(day) = plan.days.iter().find(|d| d.exercises.is_empty()) {
        bail!("{} has no exercises", day.day);
    }

    if let Some(name) = name {
        plan.name = name;
    }
    if plan.name.is_empty() {
        plan.name = "Imported plan".to_string();
    }

    Ok(plan)
}

pub async fn import_plan(file: &Path, name: Option<String>, activate: bool) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let plan = parse_plan(&contents, name)?;

    let storage = Storage::init()?;
    storage.save_plan(&plan)?;
    if activate {
        storage.set_active_plan(&plan.id)?;
    }

    println!(
        "{} Imported {} ({} days)",
        "✓".green(),
        plan.name.bold(),
        plan.days.len()
    );
    println!("  ID: {}", plan.id.dimmed());

    Ok(())
}

pub async fn list_plans() -> Result<()> {
    let storage = Storage::init()?;
    let plans = storage.list_plans()?;
    let active = storage.active_plan()?.map(|p| p.id);

    if plans.is_empty() {
        println!("No plans yet. Import one with `ai-trainer plan import FILE`.");
        return Ok(());
    }

    for plan in plans {
        let marker = if active.as_deref() == Some(plan.id.as_str()) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {}  {:<24} {} days  {}",
            marker,
            plan.id.dimmed(),
            plan.name,
            plan.days.len(),
            plan.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub async fn activate_plan(id: &str) -> Result<()> {
    let storage = Storage::init()?;
    storage.set_active_plan(id)?;
    println!("{} Active plan set to {}", "✓".green(), id);
    Ok(())
}

/// Print the active plan, or one day of it
pub async fn show_plan(day: Option<String>) -> Result<()> {
    let storage = Storage::init()?;
    let plan = storage
        .active_plan()?
        .context("No plan imported yet. Run `ai-trainer plan import FILE` first")?;

    let days: Vec<&DayWorkout> = match &day {
        Some(label) => vec![plan.day(label).with_context(|| format!("No {} in plan", label))?],
        None => plan.days.iter().collect(),
    };

    println!("{}", plan.name.bold());
    println!("────────────────────────────────");

    for day in days {
        println!();
        println!(
            "{}  {}  {}",
            day.day.cyan().bold(),
            day.goal,
            format!("~{} min", estimate_minutes(day)).dimmed()
        );
        for exercise in &day.exercises {
            println!(
                "  {:<28} {:>4} x {:<10} rest {:>3}s  {}",
                exercise.name,
                exercise.sets,
                exercise.reps,
                exercise.rest,
                exercise.suggested_weight.dimmed()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAYS: &str = r#"[
        {
            "day": "Monday",
            "goal": "Legs",
            "exercises": [
                {"name": "Squat", "sets": "3", "reps": "8-12", "rest": 90,
                 "suggestedWeight": "135 lbs", "restAfterExercise": 120}
            ]
        }
    ]"#;

    #[test]
    fn test_parse_bare_days() {
        let plan = parse_plan(DAYS, Some("Legs".to_string())).unwrap();
        assert_eq!(plan.name, "Legs");
        assert_eq!(plan.days[0].exercises[0].rest_after_exercise, Some(120));
        assert!(!plan.id.is_empty());
    }

    #[test]
    fn test_parse_full_plan_keeps_name() {
        let contents = format!(r#"{{"name": "Base", "days": {}}}"#, DAYS);
        let plan = parse_plan(&contents, None).unwrap();
        assert_eq!(plan.name, "Base");
    }

    #[test]
    fn test_rejects_empty_day() {
        let contents = r#"[{"day": "Monday", "exercises": []}]"#;
        assert!(parse_plan(contents, None).is_err());
        assert!(parse_plan("[]", None).is_err());
        assert!(parse_plan("not json", None).is_err());
    }
}
