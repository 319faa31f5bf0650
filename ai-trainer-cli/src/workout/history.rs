//! Lookups over finalized sessions for "last time" displays and weight hints.

use chrono::{DateTime, Utc};

use crate::models::{CompletedExercise, CompletedWorkoutSession};

/// Most recent performance of `name`, newest session first
pub fn last_performance<'a>(
    sessions: &'a [CompletedWorkoutSession],
    name: &str,
) -> Option<(DateTime<Utc>, &'a CompletedExercise)> {
    sessions
        .iter()
        .filter_map(|session| {
            session
                .exercise(name)
                .filter(|e| !e.sets.is_empty())
                .map(|e| (session.date, e))
        })
        .max_by_key(|(date, _)| *date)
}

/// Weight of the last weighted set of `name` in the most recent session
/// that recorded one
pub fn last_weight(sessions: &[CompletedWorkoutSession], name: &str) -> Option<f64> {
    let mut ordered: Vec<&CompletedWorkoutSession> = sessions.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    ordered
        .into_iter()
        .filter_map(|session| session.exercise(name))
        .find_map(CompletedExercise::last_weight)
}

/// Render a weight the way a user would type it ("135", "42.5")
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", weight as i64)
    } else {
        let text = format!("{:.2}", weight);
        text.trim_end_matches('0').to_string()
    }
}

/// One-line summary such as "3 × 10 @ 135"
pub fn summarize(exercise: &CompletedExercise) -> String {
    if exercise.sets.is_empty() {
        return if exercise.skipped {
            "skipped".to_string()
        } else {
            "no sets".to_string()
        };
    }

    exercise
        .sets
        .iter()
        .map(|set| match set.weight {
            Some(w) => format!("{} @ {}", set.reps, format_weight(w)),
            None => set.reps.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
