pub mod exercise;
pub mod preferences;
pub mod session;

pub use exercise::{DayWorkout, Exercise, ExerciseReplacement, WorkoutPlan, BODYWEIGHT, MAX_SETS};
pub use preferences::Preferences;
pub use session::{
    CompletedExercise, CompletedSet, CompletedWorkoutSession, Effort, ExerciseSessionRecord,
    RecordedSet,
};
