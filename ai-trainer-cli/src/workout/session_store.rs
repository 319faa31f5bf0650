use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::WorkoutError;
use crate::models::{
    CompletedExercise, CompletedSet, CompletedWorkoutSession, DayWorkout, Effort, Exercise,
    ExerciseSessionRecord, RecordedSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Reps,
    Weight,
}

/// Keep ASCII digits only
pub fn sanitize_reps(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Keep digits and the first decimal point; later points are dropped and
/// a leading point becomes "0."
pub fn sanitize_weight(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    let mut seen_point = false;

    for c in raw.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '.' && !seen_point {
            seen_point = true;
            if out.is_empty() {
                out.push('0');
            }
            out.push('.');
        }
    }

    out
}

/// Recorded performance for the workout in progress, index-aligned with
/// the day's exercise list. Its length never changes after `initialize`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStore {
    day: String,
    records: Vec<ExerciseSessionRecord>,
}

impl SessionStore {
    pub fn initialize(day: &DayWorkout) -> Self {
        Self {
            day: day.day.clone(),
            records: day.exercises.iter().map(Self::fresh_record).collect(),
        }
    }

    /// Rebuild from persisted records
    pub fn from_records(day: String, records: Vec<ExerciseSessionRecord>) -> Self {
        Self { day, records }
    }

    fn fresh_record(exercise: &Exercise) -> ExerciseSessionRecord {
        ExerciseSessionRecord::new(exercise.name.clone(), exercise.set_count())
    }

    pub fn day(&self) -> &str {
        &self.day
    }

    pub fn records(&self) -> &[ExerciseSessionRecord] {
        &self.records
    }

    pub fn record(&self, exercise: usize) -> Result<&ExerciseSessionRecord, WorkoutError> {
        self.records
            .get(exercise)
            .ok_or(WorkoutError::ExerciseOutOfRange(exercise))
    }

    fn record_mut(&mut self, exercise: usize) -> Result<&mut ExerciseSessionRecord, WorkoutError> {
        self.records
            .get_mut(exercise)
            .ok_or(WorkoutError::ExerciseOutOfRange(exercise))
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut RecordedSet, WorkoutError> {
        self.record_mut(exercise)?
            .sets
            .get_mut(set)
            .ok_or(WorkoutError::SetOutOfRange { exercise, set })
    }

    pub fn set(&self, exercise: usize, set: usize) -> Result<&RecordedSet, WorkoutError> {
        self.record(exercise)?
            .sets
            .get(set)
            .ok_or(WorkoutError::SetOutOfRange { exercise, set })
    }

    /// Sanitize and write one field of one set. Returns the stored value.
    pub fn record_set(
        &mut self,
        exercise: usize,
        set: usize,
        field: SetField,
        raw: &str,
    ) -> Result<String, WorkoutError> {
        let slot = self.set_mut(exercise, set)?;
        let value = match field {
            SetField::Reps => sanitize_reps(raw),
            SetField::Weight => sanitize_weight(raw),
        };

        match field {
            SetField::Reps => slot.reps = value.clone(),
            SetField::Weight => slot.weight = value.clone(),
        }
        Ok(value)
    }

    pub fn mark_completed(&mut self, exercise: usize, set: usize) -> Result<(), WorkoutError> {
        let slot = self.set_mut(exercise, set)?;
        if !slot.is_filled() {
            return Err(WorkoutError::RepsMissing(set));
        }
        slot.completed = true;
        Ok(())
    }

    pub fn record_effort(&mut self, exercise: usize, effort: Effort) -> Result<(), WorkoutError> {
        self.record_mut(exercise)?.effort = Some(effort);
        Ok(())
    }

    /// Discard everything recorded for `exercise` and flag it as skipped
    pub fn mark_skipped(&mut self, exercise: usize) -> Result<(), WorkoutError> {
        let record = self.record_mut(exercise)?;
        let set_count = record.sets.len();
        *record = ExerciseSessionRecord::new(record.exercise_name.clone(), set_count);
        record.skipped = true;
        Ok(())
    }

    /// Replace the record at `exercise` with a fresh one sized for
    /// `replacement`. Other records are untouched.
    pub fn swap_exercise(&mut self, exercise: usize, replacement: &Exercise) -> Result<(), WorkoutError> {
        let record = self.record_mut(exercise)?;
        *record = Self::fresh_record(replacement);
        Ok(())
    }

    pub fn filled_sets(&self, exercise: usize) -> usize {
        self.records
            .get(exercise)
            .map(|r| r.sets.iter().filter(|s| s.is_filled()).count())
            .unwrap_or(0)
    }

    pub fn all_filled(&self, exercise: usize) -> bool {
        self.records
            .get(exercise)
            .map(|r| r.sets.iter().all(RecordedSet::is_filled))
            .unwrap_or(false)
    }

    pub fn all_completed(&self, exercise: usize) -> bool {
        self.records
            .get(exercise)
            .map(|r| r.sets.iter().all(|s| s.completed))
            .unwrap_or(false)
    }

    /// First set not yet completed
    pub fn next_open_set(&self, exercise: usize) -> Option<usize> {
        self.records
            .get(exercise)?
            .sets
            .iter()
            .position(|s| !s.completed)
    }

    /// Convert into a history record. Unfilled sets are dropped, as are
    /// exercises left without sets unless `keep_skipped` retains the ones
    /// explicitly skipped.
    pub fn finalize(&self, now: DateTime<Utc>, keep_skipped: bool) -> CompletedWorkoutSession {
        let exercises = self
            .records
            .iter()
            .filter_map(|record| {
                let sets: Vec<CompletedSet> = record
                    .sets
                    .iter()
                    .filter(|s| s.is_filled())
                    .filter_map(|s| {
                        let reps = s.reps.parse::<u32>().ok()?;
                        Some(CompletedSet {
                            reps,
                            weight: s.parsed_weight(),
                        })
                    })
                    .collect();

                if sets.is_empty() && !(keep_skipped && record.skipped) {
                    return None;
                }

                Some(CompletedExercise {
                    name: record.exercise_name.clone(),
                    sets,
                    effort: record.effort,
                    skipped: record.skipped,
                })
            })
            .collect();

        CompletedWorkoutSession {
            id: Uuid::new_v4().to_string(),
            date: now,
            day: self.day.clone(),
            exercises,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DayWorkout {
        DayWorkout {
            day: "Monday".to_string(),
            goal: "Strength".to_string(),
            target_body_parts: "Full body".to_string(),
            exercises: vec![
                Exercise::new("Bench Press", "3", "8-10", 90, "95 lbs", Some(90)),
                Exercise::new("Pull-up", "2", "6-8", 90, "Bodyweight", Some(90)),
                Exercise::new("Plank", "3", "45 sec", 30, "Bodyweight", Some(0)),
            ],
        }
    }

    #[test]
    fn test_sanitize_reps() {
        assert_eq!(sanitize_reps("12"), "12");
        assert_eq!(sanitize_reps("1a2-"), "12");
        assert_eq!(sanitize_reps("abc"), "");
    }

    #[test]
    fn test_sanitize_weight() {
        assert_eq!(sanitize_weight("135"), "135");
        assert_eq!(sanitize_weight(".5"), "0.5");
        assert_eq!(sanitize_weight("1.2.3"), "1.23");
        assert_eq!(sanitize_weight("42.5kg"), "42.5");
        assert_eq!(sanitize_weight("-7"), "7");
    }

    #[test]
    fn test_initialize_sizes_sets() {
        let store = SessionStore::initialize(&day());
        let sizes: Vec<usize> = store.records().iter().map(|r| r.sets.len()).collect();
        assert_eq!(sizes, vec![3, 2, 3]);
        assert!(store.records().iter().all(|r| r.effort.is_none()));
    }

    #[test]
    fn test_record_set_touches_one_field() {
        let mut store = SessionStore::initialize(&day());
        store.record_set(0, 1, SetField::Reps, "10x").unwrap();
        store.record_set(0, 1, SetField::Weight, "..95").unwrap();

        let set = store.set(0, 1).unwrap();
        assert_eq!(set.reps, "10");
        assert_eq!(set.weight, "0.95");
        assert!(!store.set(0, 0).unwrap().is_filled());
        assert!(!store.set(1, 1).unwrap().is_filled());
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let mut store = SessionStore::initialize(&day());
        let before = store.clone();

        assert_eq!(
            store.record_set(9, 0, SetField::Reps, "5"),
            Err(WorkoutError::ExerciseOutOfRange(9))
        );
        assert_eq!(
            store.record_set(1, 2, SetField::Reps, "5"),
            Err(WorkoutError::SetOutOfRange { exercise: 1, set: 2 })
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_swap_leaves_other_records_identical() {
        let mut store = SessionStore::initialize(&day());
        store.record_set(0, 0, SetField::Reps, "8").unwrap();
        store.record_set(0, 0, SetField::Weight, "95").unwrap();
        store.record_set(1, 0, SetField::Reps, "6").unwrap();
        store.record_effort(1, Effort::Hard).unwrap();
        store.record_set(2, 0, SetField::Reps, "45").unwrap();

        let before = store.records().to_vec();
        let replacement = Exercise::new("Lat Pulldown", "4", "10", 60, "80 lbs", Some(90));
        store.swap_exercise(1, &replacement).unwrap();

        assert_eq!(store.records()[0], before[0]);
        assert_eq!(store.records()[2], before[2]);
        assert_eq!(store.records().len(), before.len());

        let swapped = &store.records()[1];
        assert_eq!(swapped.exercise_name, "Lat Pulldown");
        assert_eq!(swapped.sets.len(), 4);
        assert!(swapped.sets.iter().all(|s| !s.is_filled()));
        assert_eq!(swapped.effort, None);
    }

    #[test]
    fn test_finalize_drops_unfilled_sets_and_empty_exercises() {
        let day = DayWorkout {
            exercises: vec![
                Exercise::new("A", "3", "10", 60, "50 lbs", Some(60)),
                Exercise::new("B", "2", "10", 60, "50 lbs", Some(0)),
            ],
            ..day()
        };
        let mut store = SessionStore::initialize(&day);
        store.record_set(0, 0, SetField::Reps, "10").unwrap();
        store.record_set(0, 0, SetField::Weight, "50").unwrap();
        store.record_set(0, 2, SetField::Reps, "8").unwrap();
        // weight typed then deleted
        store.record_set(0, 2, SetField::Weight, "").unwrap();

        let now = Utc::now();
        let session = store.finalize(now, false);

        assert_eq!(session.day, "Monday");
        assert_eq!(session.date, now);
        assert_eq!(session.exercises.len(), 1);

        let a = &session.exercises[0];
        assert_eq!(a.name, "A");
        assert_eq!(
            a.sets,
            vec![
                CompletedSet { reps: 10, weight: Some(50.0) },
                CompletedSet { reps: 8, weight: None },
            ]
        );
    }

    #[test]
    fn test_finalize_can_keep_skipped_exercises() {
        let mut store = SessionStore::initialize(&day());
        store.record_set(0, 0, SetField::Reps, "8").unwrap();
        store.record_set(1, 0, SetField::Reps, "5").unwrap();
        store.mark_skipped(1).unwrap();

        let without = store.finalize(Utc::now(), false);
        assert_eq!(without.exercises.len(), 1);

        let with = store.finalize(Utc::now(), true);
        assert_eq!(with.exercises.len(), 2);
        assert!(with.exercises[1].skipped);
        assert!(with.exercises[1].sets.is_empty());
    }

    #[test]
    fn test_mark_completed_requires_reps() {
        let mut store = SessionStore::initialize(&day());
        assert_eq!(store.mark_completed(0, 0), Err(WorkoutError::RepsMissing(0)));

        store.record_set(0, 0, SetField::Reps, "9").unwrap();
        store.mark_completed(0, 0).unwrap();
        assert_eq!(store.next_open_set(0), Some(1));
        assert!(!store.all_completed(0));
    }
}
