use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suggested-load sentinel for exercises performed without external weight
pub const BODYWEIGHT: &str = "Bodyweight";

/// Upper bound on the sets tracked for one exercise
pub const MAX_SETS: usize = 20;

/// A single plan-defined exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    /// Target set count, as text ("3", "3-4")
    pub sets: String,
    /// Rep or duration scheme ("8-12", "45 sec", "20 min")
    pub reps: String,
    /// Rest between sets in seconds
    #[serde(default)]
    pub rest: u32,
    /// Either a weight with unit ("135 lbs") or [`BODYWEIGHT`]
    #[serde(default = "default_suggested_weight")]
    pub suggested_weight: String,
    /// Rest after the last set before the next exercise; 0 for the final exercise of a day
    #[serde(default)]
    pub rest_after_exercise: Option<u32>,
}

fn default_suggested_weight() -> String {
    BODYWEIGHT.to_string()
}

impl Exercise {
    pub fn new(
        name: impl Into<String>,
        sets: impl Into<String>,
        reps: impl Into<String>,
        rest: u32,
        suggested_weight: impl Into<String>,
        rest_after_exercise: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            sets: sets.into(),
            reps: reps.into(),
            rest,
            suggested_weight: suggested_weight.into(),
            rest_after_exercise,
        }
    }

    /// Parsed set count; the leading integer of `sets`, 1 when it has none,
    /// kept within `1..=MAX_SETS`
    pub fn set_count(&self) -> usize {
        leading_integer(&self.sets).unwrap_or(1).clamp(1, MAX_SETS)
    }

    pub fn is_bodyweight(&self) -> bool {
        self.suggested_weight.trim().eq_ignore_ascii_case(BODYWEIGHT)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Parse the integer at the start of `text`, ignoring leading whitespace.
/// Saturates at `usize::MAX` when the digits overflow.
pub fn leading_integer(text: &str) -> Option<usize> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(usize::MAX))
}

/// One day of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkout {
    pub day: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub target_body_parts: String,
    pub exercises: Vec<Exercise>,
}

impl DayWorkout {
    pub fn exercise_names(&self) -> Vec<String> {
        self.exercises.iter().map(|e| e.name.clone()).collect()
    }

    pub fn is_final_exercise(&self, index: usize) -> bool {
        index + 1 >= self.exercises.len()
    }
}

/// A generated multi-day plan as held by the plan store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub days: Vec<DayWorkout>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl WorkoutPlan {
    pub fn new(name: String, days: Vec<DayWorkout>) -> Self {
        Self {
            id: new_id(),
            name,
            days,
            created_at: Utc::now(),
        }
    }

    /// Find a day by its label, case-insensitively
    pub fn day(&self, label: &str) -> Option<&DayWorkout> {
        self.days
            .iter()
            .find(|d| d.day.trim().eq_ignore_ascii_case(label.trim()))
    }

    /// Replace the first exercise named `original_name` on `day`.
    /// Returns false when no such exercise exists.
    pub fn apply_replacement(&mut self, replacement: &ExerciseReplacement) -> bool {
        let Some(day) = self
            .days
            .iter_mut()
            .find(|d| d.day.trim().eq_ignore_ascii_case(replacement.day.trim()))
        else {
            return false;
        };

        match day
            .exercises
            .iter_mut()
            .find(|e| e.has_name(&replacement.original_name))
        {
            Some(slot) => {
                *slot = replacement.replacement.clone();
                true
            }
            None => false,
        }
    }
}

/// Outward notification that an exercise was swapped mid-session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseReplacement {
    pub day: String,
    pub original_name: String,
    pub replacement: Exercise,
}
