use anyhow::Result;
use colored::Colorize;

use crate::models::Preferences;
use crate::storage::Storage;

/// Update the stored preferences; fields not given are kept
pub async fn set_preferences(
    equipment: Option<Vec<String>>,
    level: Option<String>,
    goal: Option<String>,
) -> Result<()> {
    let storage = Storage::init()?;
    let mut preferences = storage.load_preferences()?;

    apply(&mut preferences, equipment, level, goal);
    storage.save_preferences(&preferences)?;

    println!("{} Preferences saved", "✓".green());
    print(&preferences);
    Ok(())
}

pub async fn show_preferences() -> Result<()> {
    let storage = Storage::init()?;
    print(&storage.load_preferences()?);
    Ok(())
}

fn apply(
    preferences: &mut Preferences,
    equipment: Option<Vec<String>>,
    level: Option<String>,
    goal: Option<String>,
) {
    if let Some(equipment) = equipment {
        preferences.available_equipment = equipment
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }
    if let Some(level) = level {
        preferences.fitness_level = level;
    }
    if let Some(goal) = goal {
        preferences.goal = goal;
    }
}

fn print(preferences: &Preferences) {
    let equipment = if preferences.available_equipment.is_empty() {
        "bodyweight only".dimmed().to_string()
    } else {
        preferences.available_equipment.join(", ")
    };

    println!("  Equipment: {}", equipment);
    println!("  Level:     {}", preferences.fitness_level);
    println!("  Goal:      {}", preferences.goal);
}
