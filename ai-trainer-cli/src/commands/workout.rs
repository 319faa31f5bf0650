use anyhow::{bail, Context, Result};
use chrono::Local;
use colored::Colorize;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::api::AiClient;
use crate::audio::{Chime, Silent, TerminalBell};
use crate::config::Config;
use crate::models::{CompletedWorkoutSession, DayWorkout, WorkoutPlan};
use crate::storage::Storage;
use crate::ui::{App, WorkoutScreen};
use crate::workout::{estimate_minutes, estimate_plan, history, ActiveWorkout, SystemClock, WorkoutContext};

/// Run the workout screen, resuming an unfinished workout when there is one
pub async fn start_workout(config: &Config, offline: bool, day: Option<String>) -> Result<()> {
    let storage = Storage::init()?;
    let client = Arc::new(AiClient::new(&config.ai, offline)?);
    if let Some(reason) = client.unavailable_reason() {
        tracing::info!("Coach features off: {}", reason);
    }

    let chime: Arc<dyn Chime> = if config.workout.sound {
        Arc::new(TerminalBell::new())
    } else {
        Arc::new(Silent)
    };
    let context = WorkoutContext::new(Arc::new(SystemClock), chime)
        .with_history(storage.list_sessions()?)
        .with_settings(config.workout.settings())
        .online(client.is_available());

    let workout = match storage.load_active_workout()? {
        Some(snapshot) if resume_matches(&snapshot.day, day.as_deref())? => {
            println!(
                "{} Resuming {} workout started {}",
                "↻".cyan(),
                snapshot.day.day.bold(),
                snapshot
                    .started_at
                    .with_timezone(&Local)
                    .format("%H:%M")
            );
            ActiveWorkout::restore(snapshot, context)?
        }
        _ => {
            storage.clear_active_workout()?;
            let plan = storage
                .active_plan()?
                .context("No plan imported yet. Run `ai-trainer plan import FILE` first")?;
            let selected = select_day(&plan, day.as_deref())?;
            ActiveWorkout::begin(selected, context.with_plan_id(plan.id.clone()))?
        }
    };

    let preferences = storage.load_preferences()?;
    let app = App::new(workout, config.ui.weight_unit.clone());

    // The screen loop blocks; keep the runtime free for coach requests
    let finished = tokio::task::block_in_place(|| -> Result<Option<CompletedWorkoutSession>> {
        let mut screen = WorkoutScreen::new(app, storage, client, preferences)?;
        screen.run()?;
        screen.cleanup()?;
        Ok(screen.workout().completed_session().cloned())
    })?;

    match finished {
        Some(session) => print_session(&session, &config.ui.weight_unit, &config.ui.date_format),
        None => {
            println!("{} Progress saved.", "✓".green());
            println!("Run `ai-trainer workout start` to pick up where you left off.");
        }
    }

    Ok(())
}

/// Whether a saved workout should be resumed instead of starting `requested`
fn resume_matches(saved: &DayWorkout, requested: Option<&str>) -> Result<bool> {
    match requested {
        None => Ok(true),
        Some(label) if saved.day.trim().eq_ignore_ascii_case(label.trim()) => Ok(true),
        Some(label) => {
            let discard = Confirm::new()
                .with_prompt(format!(
                    "An unfinished {} workout exists. Discard it and start {}?",
                    saved.day, label
                ))
                .default(false)
                .interact()?;
            if !discard {
                bail!("Kept the unfinished {} workout", saved.day);
            }
            Ok(false)
        }
    }
}

fn select_day(plan: &WorkoutPlan, requested: Option<&str>) -> Result<DayWorkout> {
    if plan.days.is_empty() {
        bail!("Plan {} has no days", plan.name);
    }

    if let Some(label) = requested {
        return plan.day(label).cloned().with_context(|| {
            let labels: Vec<&str> = plan.days.iter().map(|d| d.day.as_str()).collect();
            format!("No {} in plan. Days: {}", label, labels.join(", "))
        });
    }

    let today = Local::now().format("%A").to_string();
    let default = plan
        .days
        .iter()
        .position(|d| d.day.trim().eq_ignore_ascii_case(&today))
        .unwrap_or(0);

    let items: Vec<String> = plan
        .days
        .iter()
        .map(|d| format!("{:<12} {} ({} exercises, ~{} min)", d.day, d.goal, d.exercises.len(), estimate_minutes(d)))
        .collect();

    let choice = Select::new()
        .with_prompt("Which workout?")
        .items(&items)
        .default(default)
        .interact()?;

    Ok(plan.days[choice].clone())
}

/// Print estimated minutes for each day of the active plan
pub async fn estimate() -> Result<()> {
    let storage = Storage::init()?;
    let plan = storage
        .active_plan()?
        .context("No plan imported yet. Run `ai-trainer plan import FILE` first")?;

    println!("{}", format!("Estimated durations: {}", plan.name).bold());
    println!("────────────────────────────────");
    for (day, minutes) in estimate_plan(&plan) {
        println!("  {:<12} {:>4} min", day, minutes.to_string().cyan());
    }

    Ok(())
}

/// One-shot exercise description from the coach
pub async fn describe(config: &Config, offline: bool, name: &str) -> Result<()> {
    let client = AiClient::new(&config.ai, offline)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Asking the coach about {}...", name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = client.exercise_description(name).await;
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            println!("{}", name.bold());
            println!();
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            println!("{} Description unavailable: {}", "✗".red(), e);
            Err(e)
        }
    }
}

/// Print a finished session
pub fn print_session(session: &CompletedWorkoutSession, unit: &str, date_format: &str) {
    println!();
    println!(
        "{} {} workout on {}",
        "✓".green(),
        session.day.bold(),
        session.date.with_timezone(&Local).format(date_format)
    );
    println!("────────────────────────────────");

    for exercise in &session.exercises {
        let effort = exercise
            .effort
            .map(|e| format!(" ({})", e))
            .unwrap_or_default();
        println!(
            "  {:<28} {}{}",
            exercise.name,
            history::summarize(exercise),
            effort.dimmed()
        );
    }

    println!();
    println!(
        "  {} sets, {} {} total volume",
        session.total_sets().to_string().cyan(),
        history::format_weight(session.total_volume()).cyan(),
        unit
    );
}
