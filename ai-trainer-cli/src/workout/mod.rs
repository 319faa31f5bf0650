pub mod assist;
pub mod classify;
pub mod clock;
pub mod duration;
pub mod error;
pub mod estimate;
pub mod history;
pub mod orchestrator;
pub mod session_store;
pub mod snapshot;
pub mod timer;

pub use assist::{
    AssistPayload, AssistPurpose, AssistQuery, AssistRequest, AssistResponse, AssistStatus,
};
pub use classify::{classify, ExerciseProfile};
pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::parse_duration;
pub use error::WorkoutError;
pub use estimate::{estimate_minutes, estimate_plan};
pub use orchestrator::{
    ActiveWorkout, PendingAction, WorkoutContext, WorkoutEvent, WorkoutPhase, WorkoutSettings,
};
pub use session_store::{SessionStore, SetField};
pub use snapshot::{ActiveWorkoutSnapshot, TimerKind, TimerSnapshot};
pub use timer::{Timer, TimerEvent};
