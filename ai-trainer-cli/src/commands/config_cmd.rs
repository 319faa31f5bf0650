use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::Command;

use crate::config::Config;

pub async fn show_config(path: &Path) -> Result<()> {
    let config = Config::load_from(path)?;
    let config_str = toml::to_string_pretty(&config)?;

    println!("Current Configuration ({})", path.display());
    println!("────────────────────────────────");
    println!();
    println!("{}", config_str);

    match config.ai.api_key() {
        Some(_) => println!("{} {} is set", "✓".green(), config.ai.api_key_env),
        None => println!(
            "{} {} is not set, coach features are off",
            "!".yellow(),
            config.ai.api_key_env
        ),
    }

    Ok(())
}

pub async fn edit_config(path: &Path) -> Result<()> {
    // Ensure config file exists
    if !path.exists() {
        Config::default().save_to(path)?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Command::new(editor).arg(path).status()?;

    // Reject an edit that no longer parses
    Config::load_from(path)?;
    println!("{} Configuration saved!", "✓".green());

    Ok(())
}

pub async fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save_to(path)?;

    println!("{} Configuration initialized at: {}", "✓".green(), path.display());
    println!();
    println!("You can edit it with: ai-trainer config edit");

    Ok(())
}
