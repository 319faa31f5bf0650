use crate::models::{DayWorkout, WorkoutPlan};

use super::duration::parse_duration;

/// Setup, warm-up and cool-down allowance
pub const BASE_OVERHEAD_SECONDS: u32 = 300;
/// Assumed working time of one resistance set
pub const AVERAGE_SET_SECONDS: u32 = 45;
/// Transition used when an exercise carries no inter-exercise rest
pub const DEFAULT_TRANSITION_SECONDS: u32 = 60;

/// Estimate the length of a day's session in whole minutes
pub fn estimate_minutes(day: &DayWorkout) -> u32 {
    let count = day.exercises.len();
    let mut total: u64 = BASE_OVERHEAD_SECONDS as u64;

    for (index, exercise) in day.exercises.iter().enumerate() {
        let set_count = exercise.set_count() as u64;
        let per_set = parse_duration(&exercise.reps).unwrap_or(AVERAGE_SET_SECONDS) as u64;

        total = total.saturating_add(set_count.saturating_mul(per_set));
        if set_count > 1 {
            total = total.saturating_add((set_count - 1).saturating_mul(exercise.rest as u64));
        }

        if index + 1 < count {
            total = total.saturating_add(
                exercise
                    .rest_after_exercise
                    .unwrap_or(DEFAULT_TRANSITION_SECONDS) as u64,
            );
        }
    }

    (total as f64 / 60.0).round() as u32
}

/// Per-day estimates for a whole plan, in plan order
pub fn estimate_plan(plan: &WorkoutPlan) -> Vec<(String, u32)> {
    plan.days
        .iter()
        .map(|day| (day.day.clone(), estimate_minutes(day)))
        .collect()
}
