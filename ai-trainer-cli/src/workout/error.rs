use thiserror::Error;

/// Misuse of the workout state machine. None of these mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkoutError {
    #[error("Exercise index {0} is out of range")]
    ExerciseOutOfRange(usize),

    #[error("Set {set} is out of range for exercise {exercise}")]
    SetOutOfRange { exercise: usize, set: usize },

    #[error("Set {0} has no reps recorded")]
    RepsMissing(usize),

    #[error("Cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Exercise is not timed")]
    NotTimed,

    #[error("Weight does not apply to this exercise")]
    WeightNotApplicable,

    #[error("Every set needs reps before rating effort")]
    SetsIncomplete,

    #[error("Every set of this exercise is already completed")]
    AllSetsCompleted,

    #[error("No action is awaiting confirmation")]
    NothingPending,

    #[error("Workout day has no exercises")]
    EmptyWorkout,
}
