use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use std::fs;
use std::path::Path;

use super::workout::print_session;
use crate::config::Config;
use crate::storage::Storage;
use crate::workout::history::format_weight;

pub async fn list_sessions(config: &Config, limit: usize) -> Result<()> {
    let storage = Storage::init()?;
    let sessions = storage.list_sessions()?;

    if sessions.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    println!("{}", "Recent Workouts".bold());
    println!("────────────────────────────────");

    for session in sessions.iter().take(limit) {
        println!(
            "  {}  {:<12} {:>2} exercises {:>3} sets {:>8} {}  {}",
            session.date.format(&config.ui.date_format),
            session.day,
            session.exercises.len(),
            session.total_sets(),
            format_weight(session.total_volume()),
            config.ui.weight_unit,
            session.id.dimmed()
        );
    }

    if sessions.len() > limit {
        println!();
        println!("  {} more, use --limit to show them", sessions.len() - limit);
    }

    Ok(())
}

pub async fn show_session(config: &Config, id: &str) -> Result<()> {
    let storage = Storage::init()?;
    let session = storage
        .get_session(id)?
        .with_context(|| format!("No workout with ID {}", id))?;

    print_session(&session, &config.ui.weight_unit, &config.ui.date_format);
    Ok(())
}

pub async fn delete_session(id: &str, force: bool) -> Result<()> {
    let storage = Storage::init()?;
    let session = storage
        .get_session(id)?
        .with_context(|| format!("No workout with ID {}", id))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete the {} workout from {}?",
                session.day,
                session.date.format("%Y-%m-%d")
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    storage.delete_session(id)?;
    println!("{} Deleted workout {}", "✓".green(), id);
    Ok(())
}

/// Write all sessions as pretty JSON to `output`, or stdout
pub async fn export_sessions(output: Option<&Path>) -> Result<()> {
    let storage = Storage::init()?;
    let sessions = storage.list_sessions()?;
    let json = serde_json::to_string_pretty(&sessions).context("Failed to serialize history")?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Exported {} workouts to {}",
                "✓".green(),
                sessions.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
