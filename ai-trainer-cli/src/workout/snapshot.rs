use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::orchestrator::WorkoutPhase;
use crate::models::{DayWorkout, ExerciseSessionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    Rest,
    Exercise,
}

/// A running timer, stored as its absolute deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub kind: TimerKind,
    pub target_end: DateTime<Utc>,
    pub duration: u32,
}

/// Everything needed to pick an interrupted workout back up.
///
/// `day` is the session's own copy, so swaps made before the interruption
/// survive. Remaining timer time is recomputed from `target_end` on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWorkoutSnapshot {
    pub plan_id: Option<String>,
    pub day: DayWorkout,
    pub phase: WorkoutPhase,
    pub records: Vec<ExerciseSessionRecord>,
    pub timer: Option<TimerSnapshot>,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl ActiveWorkoutSnapshot {
    /// Exercise the user was on, for resume prompts
    pub fn exercise_name(&self) -> Option<&str> {
        self.phase
            .exercise_index()
            .and_then(|i| self.day.exercises.get(i))
            .map(|e| e.name.as_str())
    }
}
