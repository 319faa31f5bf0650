use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subjective post-exercise feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effort {
    Easy,
    Good,
    Hard,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::Easy => write!(f, "Easy"),
            Effort::Good => write!(f, "Good"),
            Effort::Hard => write!(f, "Hard"),
        }
    }
}

impl std::str::FromStr for Effort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Effort::Easy),
            "good" => Ok(Effort::Good),
            "hard" => Ok(Effort::Hard),
            _ => Err(anyhow::anyhow!("Invalid effort rating: {}", s)),
        }
    }
}

/// In-progress entry for one set. Fields hold sanitized user input;
/// an empty `reps` means the set has not been filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedSet {
    pub reps: String,
    pub weight: String,
    pub completed: bool,
}

impl RecordedSet {
    pub fn is_filled(&self) -> bool {
        !self.reps.is_empty()
    }

    pub fn parsed_weight(&self) -> Option<f64> {
        parse_weight(&self.weight)
    }
}

/// Parse a weight entry; empty or unparseable input is `None`, never zero
pub fn parse_weight(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|w| w.is_finite())
}

/// Per-exercise record kept while a workout is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSessionRecord {
    pub exercise_name: String,
    pub sets: Vec<RecordedSet>,
    pub effort: Option<Effort>,
    pub skipped: bool,
}

impl ExerciseSessionRecord {
    pub fn new(exercise_name: String, set_count: usize) -> Self {
        Self {
            exercise_name,
            sets: vec![RecordedSet::default(); set_count],
            effort: None,
            skipped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSet {
    pub reps: u32,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedExercise {
    pub name: String,
    pub sets: Vec<CompletedSet>,
    pub effort: Option<Effort>,
    pub skipped: bool,
}

impl CompletedExercise {
    /// Weight of the last set that carried one
    pub fn last_weight(&self) -> Option<f64> {
        self.sets.iter().rev().find_map(|s| s.weight)
    }
}

/// Finalized workout as written to history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkoutSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub day: String,
    pub exercises: Vec<CompletedExercise>,
}

impl CompletedWorkoutSession {
    pub fn exercise(&self, name: &str) -> Option<&CompletedExercise> {
        self.exercises
            .iter()
            .find(|e| e.name.trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of reps × weight over weighted sets
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter_map(|s| s.weight.map(|w| w * s.reps as f64))
            .sum()
    }
}
