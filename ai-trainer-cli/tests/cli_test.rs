use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PLAN: &str = r#"{
    "name": "Base Strength",
    "days": [
        {
            "day": "Monday",
            "goal": "Legs",
            "exercises": [
                {"name": "Squat", "sets": "3", "reps": "8-12", "rest": 90,
                 "suggestedWeight": "135 lbs", "restAfterExercise": 120},
                {"name": "Plank", "sets": "3", "reps": "45 sec", "rest": 30,
                 "suggestedWeight": "Bodyweight", "restAfterExercise": 0}
            ]
        }
    ]
}"#;

/// Command isolated from the user's database and config
fn trainer(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ai-trainer").unwrap();
    cmd.env("AI_TRAINER_DB_PATH", dir.path().join("db"))
        .env("AI_TRAINER_CONFIG", dir.path().join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("AI_TRAINER_API_KEY");
    cmd
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("ai-trainer").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AI-generated workout plans"))
        .stdout(predicate::str::contains("workout"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_version_command() {
    let mut cmd = Command::cargo_bin("ai-trainer").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_completions_command() {
    let mut cmd = Command::cargo_bin("ai-trainer").unwrap();
    cmd.arg("completions").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_ai-trainer"));
}

#[test]
fn test_import_then_show_and_estimate() {
    let dir = TempDir::new().unwrap();
    let plan_file = dir.path().join("plan.json");
    fs::write(&plan_file, PLAN).unwrap();

    trainer(&dir)
        .args(["plan", "import"])
        .arg(&plan_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported"))
        .stdout(predicate::str::contains("Base Strength"));

    trainer(&dir)
        .args(["plan", "show", "--day", "monday"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat"))
        .stdout(predicate::str::contains("45 sec"));

    trainer(&dir)
        .args(["workout", "estimate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday"))
        .stdout(predicate::str::contains("min"));
}

#[test]
fn test_estimate_without_plan_fails() {
    let dir = TempDir::new().unwrap();

    trainer(&dir)
        .args(["workout", "estimate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No plan imported"));
}

#[test]
fn test_empty_history_exports_empty_array() {
    let dir = TempDir::new().unwrap();

    trainer(&dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts recorded yet"));

    trainer(&dir)
        .args(["history", "export"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_describe_offline_is_unavailable() {
    let dir = TempDir::new().unwrap();

    trainer(&dir)
        .args(["--offline", "workout", "describe", "Squat"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Description unavailable"));
}

#[test]
fn test_preferences_round_trip() {
    let dir = TempDir::new().unwrap();

    trainer(&dir)
        .args(["preferences", "set", "--equipment", "dumbbells,bench", "--goal", "strength"])
        .assert()
        .success();

    trainer(&dir)
        .args(["preferences", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dumbbells, bench"))
        .stdout(predicate::str::contains("strength"));
}

#[test]
fn test_config_init_writes_file() {
    let dir = TempDir::new().unwrap();

    trainer(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));

    let contents = fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(contents.contains("[workout]"));
    assert!(contents.contains("weight_unit"));
}
