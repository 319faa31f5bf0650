use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::assist::{
    local_progression, AssistPayload, AssistPurpose, AssistQuery, AssistRequest, AssistResponse,
    AssistStatus, AssistTracker,
};
use super::classify::{classify, ExerciseProfile};
use super::clock::Clock;
use super::error::WorkoutError;
use super::history;
use super::session_store::{SessionStore, SetField};
use super::snapshot::{ActiveWorkoutSnapshot, TimerKind, TimerSnapshot};
use super::timer::{Timer, TimerEvent};
use crate::audio::Chime;
use crate::models::{
    CompletedExercise, CompletedWorkoutSession, DayWorkout, Effort, Exercise, ExerciseReplacement,
    ExerciseSessionRecord,
};

/// Where the workout is. Exactly one phase holds at a time, so two rests
/// can never run together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutPhase {
    EnteringSets {
        exercise_index: usize,
    },
    RunningDurationTimer {
        exercise_index: usize,
        set_index: usize,
        duration_seconds: u32,
    },
    RestingBetweenSets {
        exercise_index: usize,
    },
    RestingBetweenExercises {
        next_exercise_index: usize,
    },
    SessionComplete,
}

impl WorkoutPhase {
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutPhase::EnteringSets { .. } => "entering sets",
            WorkoutPhase::RunningDurationTimer { .. } => "running a timed set",
            WorkoutPhase::RestingBetweenSets { .. } => "resting between sets",
            WorkoutPhase::RestingBetweenExercises { .. } => "resting between exercises",
            WorkoutPhase::SessionComplete => "finished",
        }
    }

    /// Exercise on screen; the upcoming one during an inter-exercise rest
    pub fn exercise_index(&self) -> Option<usize> {
        match *self {
            WorkoutPhase::EnteringSets { exercise_index }
            | WorkoutPhase::RunningDurationTimer { exercise_index, .. }
            | WorkoutPhase::RestingBetweenSets { exercise_index } => Some(exercise_index),
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index,
            } => Some(next_exercise_index),
            WorkoutPhase::SessionComplete => None,
        }
    }

    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            WorkoutPhase::RestingBetweenSets { .. } | WorkoutPhase::RestingBetweenExercises { .. }
        )
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, WorkoutPhase::SessionComplete)
    }
}

/// Notifications for whoever drives the workout. Drained with
/// [`ActiveWorkout::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutEvent {
    ExerciseStarted { exercise_index: usize },
    SetCompleted { exercise_index: usize, set_index: usize },
    RestStarted { seconds: u32 },
    RestFinished,
    TimerWarning,
    /// The session's day copy changed; persist it to the plan
    ExerciseReplaced(ExerciseReplacement),
    SessionFinished(CompletedWorkoutSession),
    /// A finished session changed after it was saved
    SessionUpdated(CompletedWorkoutSession),
}

/// Destructive action waiting for a yes/no
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    SkipExercise {
        exercise_index: usize,
    },
    SwapExercise {
        exercise_index: usize,
        replacement: Exercise,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutSettings {
    /// Pause between rating effort and moving on
    pub effort_advance_delay_ms: u64,
    /// Keep skipped exercises (with no sets) in history
    pub keep_skipped: bool,
}

impl Default for WorkoutSettings {
    fn default() -> Self {
        Self {
            effort_advance_delay_ms: 1000,
            keep_skipped: false,
        }
    }
}

/// Collaborators and inputs shared by `begin` and `restore`
pub struct WorkoutContext {
    pub clock: Arc<dyn Clock>,
    pub chime: Arc<dyn Chime>,
    pub history: Vec<CompletedWorkoutSession>,
    pub settings: WorkoutSettings,
    pub online: bool,
    pub plan_id: Option<String>,
}

impl WorkoutContext {
    pub fn new(clock: Arc<dyn Clock>, chime: Arc<dyn Chime>) -> Self {
        Self {
            clock,
            chime,
            history: Vec::new(),
            settings: WorkoutSettings::default(),
            online: true,
            plan_id: None,
        }
    }

    pub fn with_history(mut self, history: Vec<CompletedWorkoutSession>) -> Self {
        self.history = history;
        self
    }

    pub fn with_settings(mut self, settings: WorkoutSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}

/// State machine for one workout day.
///
/// All mutation goes through the methods below; each one either applies a
/// whole transition or returns an error and leaves state untouched. Timers
/// are advanced by calling [`ActiveWorkout::tick`] about once a second.
pub struct ActiveWorkout {
    clock: Arc<dyn Clock>,
    plan_id: Option<String>,
    day: DayWorkout,
    store: SessionStore,
    phase: WorkoutPhase,
    rest_timer: Timer,
    exercise_timer: Timer,
    history: Vec<CompletedWorkoutSession>,
    settings: WorkoutSettings,
    pending: Option<PendingAction>,
    effort_advance_at: Option<DateTime<Utc>>,
    assist: AssistTracker,
    description: Option<String>,
    alternatives: Vec<Exercise>,
    progression: Option<Exercise>,
    progression_is_fallback: bool,
    started_at: DateTime<Utc>,
    completed: Option<CompletedWorkoutSession>,
    events: Vec<WorkoutEvent>,
    revision: u64,
}

impl fmt::Debug for ActiveWorkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveWorkout")
            .field("day", &self.day.day)
            .field("phase", &self.phase)
            .field("pending", &self.pending)
            .field("revision", &self.revision)
            .finish()
    }
}

impl ActiveWorkout {
    pub fn begin(day: DayWorkout, context: WorkoutContext) -> Result<Self, WorkoutError> {
        if day.exercises.is_empty() {
            return Err(WorkoutError::EmptyWorkout);
        }

        let store = SessionStore::initialize(&day);
        let started_at = context.clock.now();
        let mut workout = Self::assemble(
            day,
            store,
            WorkoutPhase::EnteringSets { exercise_index: 0 },
            started_at,
            context,
        );
        workout
            .events
            .push(WorkoutEvent::ExerciseStarted { exercise_index: 0 });

        tracing::info!(
            "Started {} workout with {} exercises",
            workout.day.day,
            workout.day.exercises.len()
        );
        Ok(workout)
    }

    /// Rebuild from a snapshot. A timer whose deadline passed while the
    /// app was closed is dropped and the user lands on the set entry screen.
    pub fn restore(
        snapshot: ActiveWorkoutSnapshot,
        context: WorkoutContext,
    ) -> Result<Self, WorkoutError> {
        let len = snapshot.day.exercises.len();
        if len == 0 {
            return Err(WorkoutError::EmptyWorkout);
        }
        if snapshot.records.len() != len {
            return Err(WorkoutError::ExerciseOutOfRange(snapshot.records.len()));
        }

        let phase = snapshot.phase;
        match phase.exercise_index() {
            None => {
                return Err(WorkoutError::InvalidPhase {
                    action: "resume",
                    phase: phase.name(),
                })
            }
            Some(index) if index >= len => return Err(WorkoutError::ExerciseOutOfRange(index)),
            Some(_) => {}
        }

        let store = SessionStore::from_records(snapshot.day.day.clone(), snapshot.records);
        if let WorkoutPhase::RunningDurationTimer {
            exercise_index,
            set_index,
            ..
        } = phase
        {
            store.set(exercise_index, set_index)?;
        }

        let mut workout = Self::assemble(snapshot.day, store, phase, snapshot.started_at, context);
        if snapshot.plan_id.is_some() {
            workout.plan_id = snapshot.plan_id;
        }

        let resumed = match (phase, snapshot.timer) {
            (WorkoutPhase::EnteringSets { .. }, _) => true,
            (
                WorkoutPhase::RestingBetweenSets { .. } | WorkoutPhase::RestingBetweenExercises { .. },
                Some(timer),
            ) if timer.kind == TimerKind::Rest => {
                workout.rest_timer.resume_until(timer.target_end, timer.duration)
            }
            (WorkoutPhase::RunningDurationTimer { .. }, Some(timer))
                if timer.kind == TimerKind::Exercise =>
            {
                workout
                    .exercise_timer
                    .resume_until(timer.target_end, timer.duration)
            }
            _ => false,
        };

        if !resumed {
            tracing::debug!("Discarded expired timer while {}", phase.name());
            let exercise_index = phase.exercise_index().unwrap_or(0);
            workout.phase = WorkoutPhase::EnteringSets { exercise_index };
        }

        tracing::info!(
            "Resumed {} workout while {}",
            workout.day.day,
            workout.phase.name()
        );
        Ok(workout)
    }

    fn assemble(
        day: DayWorkout,
        store: SessionStore,
        phase: WorkoutPhase,
        started_at: DateTime<Utc>,
        context: WorkoutContext,
    ) -> Self {
        Self {
            rest_timer: Timer::new(context.clock.clone(), context.chime.clone()),
            exercise_timer: Timer::new(context.clock.clone(), context.chime),
            clock: context.clock,
            plan_id: context.plan_id,
            day,
            store,
            phase,
            history: context.history,
            settings: context.settings,
            pending: None,
            effort_advance_at: None,
            assist: AssistTracker::new(context.online),
            description: None,
            alternatives: Vec::new(),
            progression: None,
            progression_is_fallback: false,
            started_at,
            completed: None,
            events: Vec::new(),
            revision: 0,
        }
    }

    /// Resumable state, or `None` once the workout has finished
    pub fn snapshot(&self) -> Option<ActiveWorkoutSnapshot> {
        if self.phase.is_complete() {
            return None;
        }

        let timer = match self.phase {
            WorkoutPhase::RestingBetweenSets { .. } | WorkoutPhase::RestingBetweenExercises { .. } => {
                Self::timer_snapshot(&self.rest_timer, TimerKind::Rest)
            }
            WorkoutPhase::RunningDurationTimer { .. } => {
                Self::timer_snapshot(&self.exercise_timer, TimerKind::Exercise)
            }
            _ => None,
        };

        Some(ActiveWorkoutSnapshot {
            plan_id: self.plan_id.clone(),
            day: self.day.clone(),
            phase: self.phase,
            records: self.store.records().to_vec(),
            timer,
            started_at: self.started_at,
            saved_at: self.clock.now(),
        })
    }

    fn timer_snapshot(timer: &Timer, kind: TimerKind) -> Option<TimerSnapshot> {
        timer.target_end().map(|target_end| TimerSnapshot {
            kind,
            target_end,
            duration: timer.duration(),
        })
    }

    // Accessors

    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    pub fn day(&self) -> &DayWorkout {
        &self.day
    }

    pub fn plan_id(&self) -> Option<&str> {
        self.plan_id.as_deref()
    }

    pub fn records(&self) -> &[ExerciseSessionRecord] {
        self.store.records()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.phase.exercise_index()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current_index().and_then(|i| self.day.exercises.get(i))
    }

    pub fn current_record(&self) -> Option<&ExerciseSessionRecord> {
        self.current_index()
            .and_then(|i| self.store.record(i).ok())
    }

    /// Derived weight / cardio / timed classification of the current exercise
    pub fn current_profile(&self) -> Option<ExerciseProfile> {
        self.current_exercise().map(classify)
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_timer.remaining()
    }

    pub fn exercise_timer_remaining(&self) -> u32 {
        self.exercise_timer.remaining()
    }

    pub fn is_rest_running(&self) -> bool {
        self.rest_timer.is_running()
    }

    pub fn is_exercise_timer_running(&self) -> bool {
        self.exercise_timer.is_running()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn completed_session(&self) -> Option<&CompletedWorkoutSession> {
        self.completed.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn settings(&self) -> WorkoutSettings {
        self.settings
    }

    /// Bumped on every state change; persist a snapshot when it moves
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Most recent historical performance of the current exercise
    pub fn last_time(&self) -> Option<(DateTime<Utc>, &CompletedExercise)> {
        let exercise = self.current_exercise()?;
        history::last_performance(&self.history, &exercise.name)
    }

    pub fn drain_events(&mut self) -> Vec<WorkoutEvent> {
        std::mem::take(&mut self.events)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn invalid(&self, action: &'static str) -> WorkoutError {
        WorkoutError::InvalidPhase {
            action,
            phase: self.phase.name(),
        }
    }

    /// Exercise whose sets may be edited right now
    fn editable_index(&self, action: &'static str) -> Result<usize, WorkoutError> {
        match self.phase {
            WorkoutPhase::EnteringSets { exercise_index }
            | WorkoutPhase::RestingBetweenSets { exercise_index } => Ok(exercise_index),
            _ => Err(self.invalid(action)),
        }
    }

    // Set entry

    pub fn enter_reps(&mut self, set: usize, raw: &str) -> Result<String, WorkoutError> {
        let index = self.editable_index("enter reps")?;
        let value = self.store.record_set(index, set, SetField::Reps, raw)?;
        self.touch();
        Ok(value)
    }

    pub fn enter_weight(&mut self, set: usize, raw: &str) -> Result<String, WorkoutError> {
        let index = self.editable_index("enter weight")?;
        if !classify(&self.day.exercises[index]).weight_applicable {
            return Err(WorkoutError::WeightNotApplicable);
        }
        let value = self.store.record_set(index, set, SetField::Weight, raw)?;
        self.touch();
        Ok(value)
    }

    /// Suggested weight for `set` (> 0): a weight already entered for this
    /// exercise in the session, otherwise the last one in history
    pub fn last_weight_hint(&self, set: usize) -> Option<String> {
        if set == 0 {
            return None;
        }
        let index = self.current_index()?;
        self.session_weight(index, set)
            .or_else(|| self.history_weight(index))
    }

    /// Fill the weight of `set` from [`Self::last_weight_hint`]
    pub fn use_last_weight(&mut self, set: usize) -> Result<Option<String>, WorkoutError> {
        let index = self.editable_index("use last weight")?;
        if !classify(&self.day.exercises[index]).weight_applicable {
            return Err(WorkoutError::WeightNotApplicable);
        }
        self.store.set(index, set)?;

        let Some(hint) = self.last_weight_hint(set) else {
            return Ok(None);
        };
        let value = self
            .store
            .record_set(index, set, SetField::Weight, &hint)?;
        self.touch();
        Ok(Some(value))
    }

    /// Weight entered this session for exercise `index`, ignoring `set` itself.
    /// Earlier sets win, nearest first; sets filled ahead of `set` come next.
    fn session_weight(&self, index: usize, set: usize) -> Option<String> {
        let record = self.store.record(index).ok()?;
        let split = set.min(record.sets.len());
        let (before, rest) = record.sets.split_at(split);
        let after = rest.get(1..).unwrap_or_default();
        let in_record = before
            .iter()
            .rev()
            .chain(after.iter())
            .find(|s| !s.weight.is_empty());
        if let Some(set) = in_record {
            return Some(set.weight.clone());
        }

        // Same exercise appearing elsewhere in the day
        self.store
            .records()
            .iter()
            .enumerate()
            .rev()
            .filter(|(i, r)| {
                *i != index
                    && r.exercise_name
                        .trim()
                        .eq_ignore_ascii_case(record.exercise_name.trim())
            })
            .flat_map(|(_, r)| r.sets.iter().rev())
            .find(|s| !s.weight.is_empty())
            .map(|s| s.weight.clone())
    }

    fn history_weight(&self, index: usize) -> Option<String> {
        let exercise = self.day.exercises.get(index)?;
        history::last_weight(&self.history, &exercise.name).map(history::format_weight)
    }

    pub fn complete_set(&mut self, set: usize) -> Result<(), WorkoutError> {
        let index = self.editable_index("complete a set")?;
        if self.store.set(index, set)?.completed {
            return Ok(());
        }
        self.store.mark_completed(index, set)?;

        self.events.push(WorkoutEvent::SetCompleted {
            exercise_index: index,
            set_index: set,
        });
        self.after_set_completed(index);
        self.touch();
        Ok(())
    }

    fn after_set_completed(&mut self, index: usize) {
        self.stop_timers();
        let rest = self.day.exercises[index].rest;
        let rest_after = self.day.exercises[index].rest_after_exercise.unwrap_or(0);

        if self.store.all_completed(index) {
            if self.day.is_final_exercise(index) || rest_after > 0 {
                self.advance_from(index);
            } else {
                self.phase = WorkoutPhase::EnteringSets {
                    exercise_index: index,
                };
            }
            return;
        }

        if rest > 0 {
            self.start_rest(rest);
            self.phase = WorkoutPhase::RestingBetweenSets {
                exercise_index: index,
            };
        } else {
            self.phase = WorkoutPhase::EnteringSets {
                exercise_index: index,
            };
        }
    }

    // Timed sets

    /// Start the countdown for the next open set of a timed exercise.
    /// Returns the set index being timed.
    pub fn start_timed_set(&mut self) -> Result<usize, WorkoutError> {
        let index = self.editable_index("start a timed set")?;
        let duration_seconds = classify(&self.day.exercises[index])
            .duration_seconds
            .ok_or(WorkoutError::NotTimed)?;
        let set_index = self
            .store
            .next_open_set(index)
            .ok_or(WorkoutError::AllSetsCompleted)?;

        self.stop_timers();
        self.effort_advance_at = None;
        self.exercise_timer.start(duration_seconds);
        self.phase = WorkoutPhase::RunningDurationTimer {
            exercise_index: index,
            set_index,
            duration_seconds,
        };
        self.touch();
        Ok(set_index)
    }

    /// Stop a timed set early, recording the seconds actually held
    pub fn stop_timed_set(&mut self) -> Result<u32, WorkoutError> {
        let WorkoutPhase::RunningDurationTimer {
            exercise_index,
            set_index,
            ..
        } = self.phase
        else {
            return Err(self.invalid("stop a timed set"));
        };

        self.exercise_timer.stop();
        let elapsed = self.exercise_timer.elapsed();
        self.finish_timed_set(exercise_index, set_index, elapsed)?;
        Ok(elapsed)
    }

    fn finish_timed_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        seconds: u32,
    ) -> Result<(), WorkoutError> {
        self.store
            .record_set(exercise_index, set_index, SetField::Reps, &seconds.to_string())?;
        self.store.mark_completed(exercise_index, set_index)?;
        tracing::debug!(
            "Timed set {} of exercise {} recorded at {}s",
            set_index,
            exercise_index,
            seconds
        );

        self.events.push(WorkoutEvent::SetCompleted {
            exercise_index,
            set_index,
        });
        self.after_set_completed(exercise_index);
        self.touch();
        Ok(())
    }

    // Rest and advancing

    /// End the current rest early. Returns false, changing nothing, when
    /// no rest is running.
    pub fn skip_rest(&mut self) -> bool {
        match self.phase {
            WorkoutPhase::RestingBetweenSets { exercise_index } => {
                self.rest_timer.stop();
                self.phase = WorkoutPhase::EnteringSets { exercise_index };
                self.events.push(WorkoutEvent::RestFinished);
            }
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index,
            } => {
                self.rest_timer.stop();
                self.events.push(WorkoutEvent::RestFinished);
                self.enter_exercise(next_exercise_index);
            }
            _ => return false,
        }
        self.touch();
        true
    }

    /// Rate the exercise. On the set screen this schedules the move to the
    /// next exercise; during an inter-exercise rest it rates the exercise
    /// just finished. Once the session is complete it rates the final
    /// exercise, if that exercise made it into the session.
    pub fn record_effort(&mut self, effort: Effort) -> Result<(), WorkoutError> {
        match self.phase {
            WorkoutPhase::EnteringSets { exercise_index }
            | WorkoutPhase::RestingBetweenSets { exercise_index } => {
                if !self.store.all_filled(exercise_index) {
                    return Err(WorkoutError::SetsIncomplete);
                }
                self.store.record_effort(exercise_index, effort)?;
                let delay = Duration::milliseconds(self.settings.effort_advance_delay_ms as i64);
                self.effort_advance_at = Some(self.now() + delay);
            }
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index,
            } => {
                let finished = next_exercise_index.saturating_sub(1);
                self.store.record_effort(finished, effort)?;
            }
            WorkoutPhase::SessionComplete => self.rate_final_exercise(effort)?,
            _ => return Err(self.invalid("rate effort")),
        }
        tracing::debug!("Recorded effort {}", effort);
        self.touch();
        Ok(())
    }

    fn rate_final_exercise(&mut self, effort: Effort) -> Result<(), WorkoutError> {
        let index = self.day.exercises.len() - 1;
        let name = self.store.record(index)?.exercise_name.clone();

        let Some(session) = self.completed.as_mut() else {
            return Err(WorkoutError::InvalidPhase {
                action: "rate effort",
                phase: "finished",
            });
        };
        // finalize keeps record order, so the final record is the last entry
        let Some(exercise) = session
            .exercises
            .last_mut()
            .filter(|e| !e.skipped && !e.sets.is_empty() && e.name == name)
        else {
            return Err(WorkoutError::SetsIncomplete);
        };

        exercise.effort = Some(effort);
        let session = session.clone();
        self.store.record_effort(index, effort)?;
        self.events.push(WorkoutEvent::SessionUpdated(session));
        Ok(())
    }

    /// Leave the current exercise now
    pub fn next_exercise(&mut self) -> Result<(), WorkoutError> {
        match self.phase {
            WorkoutPhase::EnteringSets { exercise_index }
            | WorkoutPhase::RestingBetweenSets { exercise_index } => self.advance_from(exercise_index),
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index,
            } => {
                self.rest_timer.stop();
                self.enter_exercise(next_exercise_index);
            }
            _ => return Err(self.invalid("move to the next exercise")),
        }
        self.touch();
        Ok(())
    }

    /// Leaving exercise `index`: finish after the last one, rest first when
    /// the plan asks for it and something was performed, else move straight on.
    fn advance_from(&mut self, index: usize) {
        self.stop_timers();
        self.effort_advance_at = None;
        self.pending = None;

        if self.day.is_final_exercise(index) {
            self.finish();
            return;
        }

        let rest_after = self.day.exercises[index].rest_after_exercise.unwrap_or(0);
        if rest_after > 0 && self.store.filled_sets(index) > 0 {
            self.start_rest(rest_after);
            self.phase = WorkoutPhase::RestingBetweenExercises {
                next_exercise_index: index + 1,
            };
            self.clear_assist_data();
        } else {
            self.enter_exercise(index + 1);
        }
    }

    fn enter_exercise(&mut self, index: usize) {
        self.stop_timers();
        self.effort_advance_at = None;
        self.pending = None;
        self.clear_assist_data();
        self.phase = WorkoutPhase::EnteringSets {
            exercise_index: index,
        };
        self.events.push(WorkoutEvent::ExerciseStarted {
            exercise_index: index,
        });
        tracing::debug!("Moved to exercise {} ({})", index, self.day.exercises[index].name);
    }

    fn start_rest(&mut self, seconds: u32) {
        self.stop_timers();
        self.rest_timer.start(seconds);
        self.events.push(WorkoutEvent::RestStarted { seconds });
    }

    fn stop_timers(&mut self) {
        self.rest_timer.stop();
        self.exercise_timer.stop();
    }

    // Confirmed actions

    pub fn request_skip_exercise(&mut self) -> Result<(), WorkoutError> {
        let exercise_index = self.editable_index("skip an exercise")?;
        self.pending = Some(PendingAction::SkipExercise { exercise_index });
        self.touch();
        Ok(())
    }

    pub fn request_swap(&mut self, replacement: Exercise) -> Result<(), WorkoutError> {
        let WorkoutPhase::EnteringSets { exercise_index } = self.phase else {
            return Err(self.invalid("swap an exercise"));
        };
        self.pending = Some(PendingAction::SwapExercise {
            exercise_index,
            replacement,
        });
        self.touch();
        Ok(())
    }

    pub fn confirm_pending(&mut self) -> Result<(), WorkoutError> {
        let pending = self.pending.take().ok_or(WorkoutError::NothingPending)?;

        match pending {
            PendingAction::SkipExercise { exercise_index } => {
                if self.phase.exercise_index() != Some(exercise_index)
                    || matches!(self.phase, WorkoutPhase::RestingBetweenExercises { .. })
                {
                    return Err(self.invalid("skip an exercise"));
                }
                self.stop_timers();
                self.store.mark_skipped(exercise_index)?;
                tracing::info!("Skipped {}", self.day.exercises[exercise_index].name);
                self.advance_from(exercise_index);
            }
            PendingAction::SwapExercise {
                exercise_index,
                replacement,
            } => {
                if self.editable_index("swap an exercise")? != exercise_index {
                    return Err(self.invalid("swap an exercise"));
                }
                self.store.swap_exercise(exercise_index, &replacement)?;
                self.stop_timers();

                let original = std::mem::replace(
                    &mut self.day.exercises[exercise_index],
                    replacement.clone(),
                );
                tracing::info!("Swapped {} for {}", original.name, replacement.name);

                self.events
                    .push(WorkoutEvent::ExerciseReplaced(ExerciseReplacement {
                        day: self.day.day.clone(),
                        original_name: original.name,
                        replacement,
                    }));
                self.effort_advance_at = None;
                self.clear_assist_data();
                self.phase = WorkoutPhase::EnteringSets { exercise_index };
            }
        }

        self.touch();
        Ok(())
    }

    pub fn decline_pending(&mut self) -> Result<(), WorkoutError> {
        self.pending.take().ok_or(WorkoutError::NothingPending)?;
        self.touch();
        Ok(())
    }

    /// Finish now with whatever has been recorded
    pub fn end_workout(&mut self) -> Result<(), WorkoutError> {
        if self.phase.is_complete() {
            return Err(self.invalid("end the workout"));
        }
        self.finish();
        self.touch();
        Ok(())
    }

    fn finish(&mut self) {
        self.stop_timers();
        self.pending = None;
        self.effort_advance_at = None;

        let session = self.store.finalize(self.now(), self.settings.keep_skipped);
        tracing::info!(
            "Workout finished: {} exercises, {} sets",
            session.exercises.len(),
            session.total_sets()
        );

        self.completed = Some(session.clone());
        self.events.push(WorkoutEvent::SessionFinished(session));
        self.phase = WorkoutPhase::SessionComplete;
    }

    // Time

    /// Advance timers and scheduled transitions. Returns true when state changed.
    pub fn tick(&mut self) -> bool {
        if self.phase.is_complete() {
            return false;
        }
        let before = self.revision;

        match self.rest_timer.tick() {
            Some(TimerEvent::Warning) => self.events.push(WorkoutEvent::TimerWarning),
            Some(TimerEvent::Completed) => {
                self.on_rest_completed();
                self.touch();
            }
            None => {}
        }

        match self.exercise_timer.tick() {
            Some(TimerEvent::Warning) => self.events.push(WorkoutEvent::TimerWarning),
            Some(TimerEvent::Completed) => {
                if let WorkoutPhase::RunningDurationTimer {
                    exercise_index,
                    set_index,
                    duration_seconds,
                } = self.phase
                {
                    if let Err(e) = self.finish_timed_set(exercise_index, set_index, duration_seconds) {
                        tracing::warn!("Could not record timed set: {}", e);
                    }
                }
            }
            None => {}
        }

        if let Some(at) = self.effort_advance_at {
            if self.now() >= at {
                self.effort_advance_at = None;
                if let WorkoutPhase::EnteringSets { exercise_index }
                | WorkoutPhase::RestingBetweenSets { exercise_index } = self.phase
                {
                    self.advance_from(exercise_index);
                }
                self.touch();
            }
        }

        self.revision != before
    }

    fn on_rest_completed(&mut self) {
        self.events.push(WorkoutEvent::RestFinished);
        match self.phase {
            WorkoutPhase::RestingBetweenSets { exercise_index } => {
                self.phase = WorkoutPhase::EnteringSets { exercise_index };
            }
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index,
            } => self.enter_exercise(next_exercise_index),
            _ => {}
        }
    }

    // AI assists

    pub fn is_online(&self) -> bool {
        self.assist.is_online()
    }

    pub fn set_online(&mut self, online: bool) {
        self.assist.set_online(online);
    }

    /// Claim a fetch for `purpose` against the current exercise. `None` when
    /// offline, already in flight, or not applicable right now.
    pub fn begin_assist(&mut self, purpose: AssistPurpose) -> Option<AssistRequest> {
        let index = self.current_index()?;
        if purpose != AssistPurpose::Description && self.editable_index("swap").is_err() {
            return None;
        }
        let exercise = self.day.exercises.get(index)?.clone();
        if !self.assist.try_begin(purpose) {
            return None;
        }

        let query = match purpose {
            AssistPurpose::Description => AssistQuery::Description {
                name: exercise.name.clone(),
            },
            AssistPurpose::Alternatives => AssistQuery::Alternatives {
                other_names: self
                    .day
                    .exercises
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, e)| e.name.clone())
                    .collect(),
                exercise: exercise.clone(),
            },
            AssistPurpose::Progression => AssistQuery::Progression {
                last_weight: self.progression_weight(index),
                exercise: exercise.clone(),
            },
        };

        tracing::debug!("Requesting {} for {}", purpose.label(), exercise.name);
        Some(AssistRequest {
            exercise_index: index,
            exercise_name: exercise.name,
            query,
        })
    }

    /// Weight a progression should keep, with the plan's unit when the
    /// entered value is a bare number
    fn progression_weight(&self, index: usize) -> String {
        let set_count = self
            .store
            .record(index)
            .map(|r| r.sets.len())
            .unwrap_or(0);
        let suggested = &self.day.exercises[index].suggested_weight;
        match self
            .session_weight(index, set_count)
            .or_else(|| self.history_weight(index))
        {
            Some(weight) => with_unit(&weight, suggested),
            None => suggested.clone(),
        }
    }

    /// Accept a fetch result. Responses for an exercise no longer on screen
    /// only release the in-flight slot.
    pub fn apply_assist(&mut self, response: AssistResponse) {
        let purpose = response.purpose();
        let current = self.current_index() == Some(response.exercise_index)
            && self
                .day
                .exercises
                .get(response.exercise_index)
                .is_some_and(|e| e.name == response.exercise_name);

        let succeeded = match response.payload {
            AssistPayload::Description(text) => {
                let ok = text.is_some();
                if current && ok {
                    self.description = text;
                }
                ok
            }
            AssistPayload::Alternatives(list) => {
                let fresh: Vec<Exercise> = list
                    .into_iter()
                    .filter(|alt| !self.day.exercises.iter().any(|e| e.has_name(&alt.name)))
                    .take(2)
                    .collect();
                let ok = !fresh.is_empty();
                if current && ok {
                    self.alternatives = fresh;
                }
                ok
            }
            AssistPayload::Progression(Some(exercise)) => {
                if current {
                    self.progression = Some(exercise);
                    self.progression_is_fallback = false;
                }
                true
            }
            AssistPayload::Progression(None) => {
                if current {
                    let index = response.exercise_index;
                    tracing::warn!("Progression unavailable, using local fallback");
                    let fallback = local_progression(
                        &self.day.exercises[index],
                        &self.progression_weight(index),
                    );
                    self.progression = Some(fallback);
                    self.progression_is_fallback = true;
                }
                true
            }
        };

        if !current {
            tracing::debug!("Discarded stale {} response", purpose.label());
        }
        self.assist.finish(purpose, succeeded);
    }

    pub fn assist_status(&self, purpose: AssistPurpose) -> AssistStatus {
        if !self.assist.is_online() {
            return AssistStatus::Offline;
        }
        if self.assist.is_in_flight(purpose) {
            return AssistStatus::Loading;
        }

        let has_data = match purpose {
            AssistPurpose::Description => self.description.is_some(),
            AssistPurpose::Alternatives => !self.alternatives.is_empty(),
            AssistPurpose::Progression => self.progression.is_some(),
        };
        if has_data {
            AssistStatus::Ready
        } else if self.assist.is_unavailable(purpose) {
            AssistStatus::Unavailable
        } else {
            AssistStatus::Idle
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn alternatives(&self) -> &[Exercise] {
        &self.alternatives
    }

    pub fn progression(&self) -> Option<&Exercise> {
        self.progression.as_ref()
    }

    pub fn progression_is_fallback(&self) -> bool {
        self.progression_is_fallback
    }

    fn clear_assist_data(&mut self) {
        self.description = None;
        self.alternatives.clear();
        self.progression = None;
        self.progression_is_fallback = false;
        self.assist.clear_failures();
    }
}

/// Attach the unit of `suggested` ("135 lbs" -> "lbs") to a bare number
fn with_unit(weight: &str, suggested: &str) -> String {
    let weight = weight.trim();
    if weight.parse::<f64>().is_err() {
        return weight.to_string();
    }

    let suggested = suggested.trim();
    let unit = suggested
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
        .trim();
    if unit.is_empty() || unit.len() == suggested.len() {
        weight.to_string()
    } else {
        format!("{} {}", weight, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Silent;
    use crate::models::CompletedSet;
    use crate::workout::clock::ManualClock;

    fn squat() -> Exercise {
        Exercise::new("Squat", "3", "8-12", 90, "135 lbs", Some(120))
    }

    fn plank() -> Exercise {
        Exercise::new("Plank", "3", "45 sec", 30, "Bodyweight", Some(0))
    }

    fn day(exercises: Vec<Exercise>) -> DayWorkout {
        DayWorkout {
            day: "Monday".to_string(),
            goal: "Strength".to_string(),
            target_body_parts: "Legs, Core".to_string(),
            exercises,
        }
    }

    fn context(clock: &ManualClock) -> WorkoutContext {
        WorkoutContext::new(Arc::new(clock.clone()), Arc::new(Silent))
    }

    fn start(exercises: Vec<Exercise>) -> (ActiveWorkout, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let workout = ActiveWorkout::begin(day(exercises), context(&clock)).unwrap();
        (workout, clock)
    }

    /// Tick once per simulated second
    fn run(workout: &mut ActiveWorkout, clock: &ManualClock, seconds: i64) {
        for _ in 0..seconds {
            clock.advance_secs(1);
            workout.tick();
        }
    }

    fn fill_and_complete(workout: &mut ActiveWorkout, set: usize, reps: &str, weight: &str) {
        workout.enter_reps(set, reps).unwrap();
        workout.enter_weight(set, weight).unwrap();
        workout.complete_set(set).unwrap();
    }

    #[test]
    fn test_squat_then_plank_scenario() {
        let (mut workout, clock) = start(vec![squat(), plank()]);

        for (set, reps) in ["10", "10", "9"].iter().enumerate() {
            fill_and_complete(&mut workout, set, reps, "135");
            if set < 2 {
                assert_eq!(
                    workout.phase(),
                    WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
                );
                assert_eq!(workout.rest_remaining(), 90);
                run(&mut workout, &clock, 90);
                assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
            }
        }

        assert_eq!(
            workout.phase(),
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index: 1
            }
        );
        assert_eq!(workout.rest_remaining(), 120);
        run(&mut workout, &clock, 120);
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 1 });

        for set in 0..3 {
            assert_eq!(workout.start_timed_set().unwrap(), set);
            run(&mut workout, &clock, 45);
            if set < 2 {
                assert_eq!(
                    workout.phase(),
                    WorkoutPhase::RestingBetweenSets { exercise_index: 1 }
                );
                run(&mut workout, &clock, 30);
            }
        }

        assert_eq!(workout.phase(), WorkoutPhase::SessionComplete);
        assert!(!workout.is_rest_running());

        let session = workout.completed_session().unwrap();
        assert_eq!(session.exercises.len(), 2);
        assert_eq!(
            session.exercises[0].sets,
            vec![
                CompletedSet { reps: 10, weight: Some(135.0) },
                CompletedSet { reps: 10, weight: Some(135.0) },
                CompletedSet { reps: 9, weight: Some(135.0) },
            ]
        );
        assert!(session.exercises[1]
            .sets
            .iter()
            .all(|s| s.reps == 45 && s.weight.is_none()));
        assert_eq!(session.exercises[1].sets.len(), 3);

        let events = workout.drain_events();
        let rests = events
            .iter()
            .filter(|e| matches!(e, WorkoutEvent::RestStarted { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, WorkoutEvent::SessionFinished(_)))
            .count();
        // 2 squat set rests, 1 exercise rest, 2 plank set rests
        assert_eq!(rests, 5);
        assert_eq!(finished, 1);
        assert!(!workout.tick());
    }

    #[test]
    fn test_skip_rest_is_idempotent() {
        let (mut workout, clock) = start(vec![squat(), plank()]);
        fill_and_complete(&mut workout, 0, "8", "135");

        assert!(workout.skip_rest());
        let revision = workout.revision();
        assert!(!workout.skip_rest());
        assert_eq!(workout.revision(), revision);

        // The stopped rest must never finish later
        workout.drain_events();
        run(&mut workout, &clock, 200);
        assert!(workout.drain_events().is_empty());
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
    }

    #[test]
    fn test_complete_set_requires_reps() {
        let (mut workout, _clock) = start(vec![squat()]);
        assert_eq!(workout.complete_set(0), Err(WorkoutError::RepsMissing(0)));
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
    }

    #[test]
    fn test_out_of_range_leaves_state_untouched() {
        let (mut workout, _clock) = start(vec![squat()]);
        let revision = workout.revision();
        let records = workout.records().to_vec();

        assert_eq!(
            workout.enter_reps(7, "10"),
            Err(WorkoutError::SetOutOfRange { exercise: 0, set: 7 })
        );
        assert_eq!(workout.revision(), revision);
        assert_eq!(workout.records(), records.as_slice());
    }

    #[test]
    fn test_weight_not_applicable_for_bodyweight_timed() {
        let (mut workout, _clock) = start(vec![plank()]);
        assert_eq!(
            workout.enter_weight(0, "20"),
            Err(WorkoutError::WeightNotApplicable)
        );
        let profile = workout.current_profile().unwrap();
        assert!(profile.is_timed);
        assert!(!profile.weight_applicable);
    }

    #[test]
    fn test_start_timed_set_rejects_rep_exercises() {
        let (mut workout, _clock) = start(vec![squat()]);
        assert_eq!(workout.start_timed_set(), Err(WorkoutError::NotTimed));
    }

    #[test]
    fn test_stop_timed_set_records_elapsed() {
        let (mut workout, clock) = start(vec![plank(), squat()]);
        workout.start_timed_set().unwrap();
        run(&mut workout, &clock, 20);

        assert_eq!(workout.stop_timed_set().unwrap(), 20);
        assert_eq!(workout.records()[0].sets[0].reps, "20");
        assert!(workout.records()[0].sets[0].completed);
        assert_eq!(
            workout.phase(),
            WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
        );
        assert!(!workout.is_exercise_timer_running());

        // Nothing left to stop
        assert!(workout.stop_timed_set().is_err());
    }

    #[test]
    fn test_effort_auto_advances_after_delay() {
        let mut first = squat();
        first.rest = 0;
        first.rest_after_exercise = Some(0);
        let (mut workout, clock) = start(vec![first, plank()]);

        for set in 0..3 {
            fill_and_complete(&mut workout, set, "8", "135");
        }
        // All done but no exercise rest configured: wait for effort or next
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });

        workout.record_effort(Effort::Good).unwrap();
        clock.advance_millis(500);
        workout.tick();
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });

        clock.advance_millis(600);
        assert!(workout.tick());
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 1 });
        assert_eq!(workout.records()[0].effort, Some(Effort::Good));
    }

    #[test]
    fn test_effort_needs_every_set_filled() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_reps(0, "8").unwrap();
        assert_eq!(
            workout.record_effort(Effort::Hard),
            Err(WorkoutError::SetsIncomplete)
        );
        assert_eq!(workout.records()[0].effort, None);
    }

    #[test]
    fn test_effort_during_exercise_rest_rates_previous() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        for set in 0..3 {
            fill_and_complete(&mut workout, set, "8", "135");
            if set < 2 {
                workout.skip_rest();
            }
        }
        assert!(matches!(
            workout.phase(),
            WorkoutPhase::RestingBetweenExercises { .. }
        ));

        workout.record_effort(Effort::Hard).unwrap();
        assert_eq!(workout.records()[0].effort, Some(Effort::Hard));
        assert!(matches!(
            workout.phase(),
            WorkoutPhase::RestingBetweenExercises { .. }
        ));
    }

    #[test]
    fn test_next_exercise_without_sets_skips_exercise_rest() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.next_exercise().unwrap();
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 1 });
        assert!(!workout.is_rest_running());
    }

    #[test]
    fn test_declined_skip_changes_nothing() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_reps(0, "10").unwrap();
        let records = workout.records().to_vec();

        workout.request_skip_exercise().unwrap();
        workout.decline_pending().unwrap();

        assert_eq!(workout.records(), records.as_slice());
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
        assert_eq!(workout.decline_pending(), Err(WorkoutError::NothingPending));
    }

    #[test]
    fn test_confirmed_skip_discards_and_moves_on() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_reps(0, "10").unwrap();

        workout.request_skip_exercise().unwrap();
        workout.confirm_pending().unwrap();

        assert!(workout.records()[0].skipped);
        assert!(!workout.records()[0].sets[0].is_filled());
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 1 });
        assert!(!workout.is_rest_running());
    }

    #[test]
    fn test_confirmed_swap_replaces_locally_and_notifies() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_reps(0, "10").unwrap();
        workout.drain_events();

        let goblet = Exercise::new("Goblet Squat", "4", "10-12", 60, "50 lbs", Some(120));
        workout.request_swap(goblet.clone()).unwrap();
        assert!(workout.pending().is_some());
        workout.confirm_pending().unwrap();

        assert_eq!(workout.day().exercises[0], goblet);
        assert_eq!(workout.records()[0].exercise_name, "Goblet Squat");
        assert_eq!(workout.records()[0].sets.len(), 4);
        assert_eq!(workout.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });

        let events = workout.drain_events();
        assert_eq!(
            events,
            vec![WorkoutEvent::ExerciseReplaced(ExerciseReplacement {
                day: "Monday".to_string(),
                original_name: "Squat".to_string(),
                replacement: goblet,
            })]
        );
    }

    #[test]
    fn test_end_workout_keeps_partial_data() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_reps(0, "10").unwrap();
        workout.enter_weight(0, "135").unwrap();
        workout.complete_set(0).unwrap();

        workout.end_workout().unwrap();
        assert_eq!(workout.phase(), WorkoutPhase::SessionComplete);
        assert!(!workout.is_rest_running());

        let session = workout.completed_session().unwrap();
        assert_eq!(session.exercises.len(), 1);
        assert_eq!(session.total_sets(), 1);

        assert!(workout.end_workout().is_err());
        assert!(workout.snapshot().is_none());
    }

    #[test]
    fn test_last_weight_prefers_session_then_history() {
        let clock = ManualClock::new(Utc::now());
        let history = vec![CompletedWorkoutSession {
            id: "old".to_string(),
            date: clock.now() - Duration::days(3),
            day: "Monday".to_string(),
            exercises: vec![CompletedExercise {
                name: "Squat".to_string(),
                sets: vec![CompletedSet { reps: 8, weight: Some(125.0) }],
                effort: None,
                skipped: false,
            }],
        }];
        let mut workout =
            ActiveWorkout::begin(day(vec![squat()]), context(&clock).with_history(history))
                .unwrap();

        assert_eq!(workout.last_weight_hint(0), None);
        assert_eq!(workout.last_weight_hint(1).as_deref(), Some("125"));

        workout.enter_weight(0, "135").unwrap();
        assert_eq!(workout.last_weight_hint(1).as_deref(), Some("135"));

        assert_eq!(workout.use_last_weight(2).unwrap().as_deref(), Some("135"));
        assert_eq!(workout.records()[0].sets[2].weight, "135");
    }

    #[test]
    fn test_last_weight_finds_weight_entered_on_later_set() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_weight(2, "145").unwrap();

        assert_eq!(workout.last_weight_hint(1).as_deref(), Some("145"));
        assert_eq!(workout.use_last_weight(1).unwrap().as_deref(), Some("145"));

        // An earlier set still takes precedence
        workout.enter_weight(0, "135").unwrap();
        assert_eq!(workout.last_weight_hint(1).as_deref(), Some("135"));
    }

    #[test]
    fn test_progression_weight_keeps_unit_from_history() {
        let clock = ManualClock::new(Utc::now());
        let history = vec![CompletedWorkoutSession {
            id: "old".to_string(),
            date: clock.now() - Duration::days(2),
            day: "Monday".to_string(),
            exercises: vec![CompletedExercise {
                name: "Squat".to_string(),
                sets: vec![CompletedSet { reps: 8, weight: Some(135.0) }],
                effort: None,
                skipped: false,
            }],
        }];
        let mut workout =
            ActiveWorkout::begin(day(vec![squat()]), context(&clock).with_history(history))
                .unwrap();

        let request = workout.begin_assist(AssistPurpose::Progression).unwrap();
        match request.query {
            AssistQuery::Progression { last_weight, .. } => assert_eq!(last_weight, "135 lbs"),
            other => panic!("unexpected query {:?}", other),
        }
    }

    #[test]
    fn test_with_unit() {
        assert_eq!(with_unit("140", "135 lbs"), "140 lbs");
        assert_eq!(with_unit("42.5", "40kg"), "42.5 kg");
        assert_eq!(with_unit("150 lbs", "135 lbs"), "150 lbs");
        assert_eq!(with_unit("20", "Bodyweight"), "20");
        assert_eq!(with_unit("20", "135"), "20");
    }

    #[test]
    fn test_oversized_set_count_is_capped() {
        let mut huge = squat();
        huge.sets = "18446744073709551615".to_string();
        let (workout, _clock) = start(vec![huge]);
        assert_eq!(workout.records()[0].sets.len(), crate::models::MAX_SETS);
    }

    #[test]
    fn test_zero_set_count_tracks_one_set() {
        let mut none = squat();
        none.sets = "0".to_string();
        let (mut workout, _clock) = start(vec![none, plank()]);
        assert_eq!(workout.records()[0].sets.len(), 1);

        fill_and_complete(&mut workout, 0, "10", "135");
        assert_eq!(
            workout.phase(),
            WorkoutPhase::RestingBetweenExercises {
                next_exercise_index: 1
            }
        );
    }

    #[test]
    fn test_timed_final_exercise_can_be_rated_after_finish() {
        let short = Exercise::new("Plank", "1", "10 sec", 0, "Bodyweight", Some(0));
        let (mut workout, clock) = start(vec![short]);

        workout.start_timed_set().unwrap();
        run(&mut workout, &clock, 11);
        assert_eq!(workout.phase(), WorkoutPhase::SessionComplete);
        let finished_id = workout.completed_session().unwrap().id.clone();
        workout.drain_events();

        workout.record_effort(Effort::Hard).unwrap();
        let session = workout.completed_session().unwrap();
        assert_eq!(session.id, finished_id);
        assert_eq!(session.exercises[0].effort, Some(Effort::Hard));
        assert_eq!(session.exercises[0].sets[0].reps, 10);

        let events = workout.drain_events();
        assert!(matches!(
            events.as_slice(),
            [WorkoutEvent::SessionUpdated(s)] if s.exercises[0].effort == Some(Effort::Hard)
        ));

        // Changing the rating is allowed
        workout.record_effort(Effort::Good).unwrap();
        assert_eq!(
            workout.completed_session().unwrap().exercises[0].effort,
            Some(Effort::Good)
        );
    }

    #[test]
    fn test_skipped_final_exercise_cannot_be_rated() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        fill_and_complete(&mut workout, 0, "10", "135");
        workout.end_workout().unwrap();

        assert_eq!(
            workout.record_effort(Effort::Easy),
            Err(WorkoutError::SetsIncomplete)
        );
        assert_eq!(workout.completed_session().unwrap().exercises[0].effort, None);
    }

    #[test]
    fn test_timed_set_stops_running_rest() {
        let (mut workout, clock) = start(vec![plank(), squat()]);
        workout.start_timed_set().unwrap();
        run(&mut workout, &clock, 45);
        assert_eq!(
            workout.phase(),
            WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
        );
        run(&mut workout, &clock, 10);
        workout.drain_events();

        assert_eq!(workout.start_timed_set().unwrap(), 1);
        assert!(!workout.is_rest_running());
        assert!(workout.is_exercise_timer_running());

        // Past the point where the rest would have ended
        run(&mut workout, &clock, 25);
        assert_eq!(
            workout.phase(),
            WorkoutPhase::RunningDurationTimer {
                exercise_index: 0,
                set_index: 1,
                duration_seconds: 45
            }
        );
        assert_eq!(workout.exercise_timer_remaining(), 20);
        assert!(!workout
            .drain_events()
            .iter()
            .any(|e| matches!(e, WorkoutEvent::RestFinished)));

        run(&mut workout, &clock, 20);
        assert_eq!(workout.records()[0].sets[1].reps, "45");
        assert_eq!(
            workout.phase(),
            WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
        );
        assert_eq!(workout.rest_remaining(), 30);
    }

    #[test]
    fn test_restore_running_duration_timer() {
        let (mut workout, clock) = start(vec![plank(), squat()]);
        workout.start_timed_set().unwrap();
        run(&mut workout, &clock, 15);

        let snapshot = workout.snapshot().unwrap();
        assert_eq!(snapshot.timer.as_ref().unwrap().kind, TimerKind::Exercise);
        drop(workout);

        clock.advance_secs(10);
        let mut resumed = ActiveWorkout::restore(snapshot.clone(), context(&clock)).unwrap();
        assert_eq!(
            resumed.phase(),
            WorkoutPhase::RunningDurationTimer {
                exercise_index: 0,
                set_index: 0,
                duration_seconds: 45
            }
        );
        assert!(resumed.is_exercise_timer_running());
        assert_eq!(resumed.exercise_timer_remaining(), 20);

        run(&mut resumed, &clock, 20);
        assert_eq!(resumed.records()[0].sets[0].reps, "45");
        assert_eq!(
            resumed.phase(),
            WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
        );

        // Closed until long after the set would have ended
        clock.advance_secs(300);
        let expired = ActiveWorkout::restore(snapshot, context(&clock)).unwrap();
        assert_eq!(expired.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
        assert!(!expired.is_exercise_timer_running());
        assert!(!expired.records()[0].sets[0].completed);
        assert!(expired.records()[0].sets[0].reps.is_empty());
    }

    #[test]
    fn test_restore_recomputes_rest() {
        let (mut workout, clock) = start(vec![squat(), plank()]);
        fill_and_complete(&mut workout, 0, "10", "135");
        let snapshot = workout.snapshot().unwrap();
        assert_eq!(snapshot.timer.as_ref().unwrap().kind, TimerKind::Rest);

        clock.advance_secs(30);
        let resumed = ActiveWorkout::restore(snapshot.clone(), context(&clock)).unwrap();
        assert_eq!(
            resumed.phase(),
            WorkoutPhase::RestingBetweenSets { exercise_index: 0 }
        );
        assert_eq!(resumed.rest_remaining(), 60);
        assert_eq!(resumed.records()[0].sets[0].reps, "10");

        clock.advance_secs(200);
        let expired = ActiveWorkout::restore(snapshot, context(&clock)).unwrap();
        assert_eq!(expired.phase(), WorkoutPhase::EnteringSets { exercise_index: 0 });
        assert!(!expired.is_rest_running());
    }

    #[test]
    fn test_restore_expired_exercise_rest_lands_on_next() {
        let (mut workout, clock) = start(vec![squat(), plank()]);
        for set in 0..3 {
            fill_and_complete(&mut workout, set, "10", "135");
            if set < 2 {
                workout.skip_rest();
            }
        }
        let snapshot = workout.snapshot().unwrap();

        clock.advance_secs(600);
        let resumed = ActiveWorkout::restore(snapshot, context(&clock)).unwrap();
        assert_eq!(resumed.phase(), WorkoutPhase::EnteringSets { exercise_index: 1 });
    }

    #[test]
    fn test_restore_rejects_mismatched_records() {
        let (workout, clock) = start(vec![squat(), plank()]);
        let mut snapshot = workout.snapshot().unwrap();
        snapshot.records.pop();
        assert!(ActiveWorkout::restore(snapshot, context(&clock)).is_err());
    }

    #[test]
    fn test_assist_offline_is_disabled() {
        let clock = ManualClock::new(Utc::now());
        let mut workout =
            ActiveWorkout::begin(day(vec![squat()]), context(&clock).online(false)).unwrap();

        assert!(workout.begin_assist(AssistPurpose::Description).is_none());
        assert_eq!(
            workout.assist_status(AssistPurpose::Description),
            AssistStatus::Offline
        );
    }

    #[test]
    fn test_assist_in_flight_and_failure() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);

        let request = workout.begin_assist(AssistPurpose::Description).unwrap();
        assert!(workout.begin_assist(AssistPurpose::Description).is_none());
        assert_eq!(
            workout.assist_status(AssistPurpose::Description),
            AssistStatus::Loading
        );

        workout.apply_assist(AssistResponse::unavailable(&request));
        assert_eq!(
            workout.assist_status(AssistPurpose::Description),
            AssistStatus::Unavailable
        );

        let retry = workout.begin_assist(AssistPurpose::Description).unwrap();
        workout.apply_assist(AssistResponse::for_request(
            &retry,
            AssistPayload::Description(Some("Sit back and down.".to_string())),
        ));
        assert_eq!(workout.description(), Some("Sit back and down."));
        assert_eq!(
            workout.assist_status(AssistPurpose::Description),
            AssistStatus::Ready
        );
    }

    #[test]
    fn test_alternatives_exclude_day_exercises() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        let request = workout.begin_assist(AssistPurpose::Alternatives).unwrap();
        match &request.query {
            AssistQuery::Alternatives { other_names, .. } => {
                assert_eq!(other_names, &vec!["Plank".to_string()])
            }
            other => panic!("unexpected query {:?}", other),
        }

        workout.apply_assist(AssistResponse::for_request(
            &request,
            AssistPayload::Alternatives(vec![
                plank(),
                Exercise::new("Leg Press", "3", "10", 90, "200 lbs", Some(120)),
                Exercise::new("Lunge", "3", "10", 60, "Bodyweight", Some(120)),
            ]),
        ));

        let names: Vec<&str> = workout.alternatives().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Leg Press", "Lunge"]);
    }

    #[test]
    fn test_progression_failure_falls_back_locally() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        workout.enter_weight(0, "140").unwrap();

        let request = workout.begin_assist(AssistPurpose::Progression).unwrap();
        match &request.query {
            AssistQuery::Progression { last_weight, .. } => assert_eq!(last_weight, "140 lbs"),
            other => panic!("unexpected query {:?}", other),
        }

        workout.apply_assist(AssistResponse::unavailable(&request));
        let progression = workout.progression().unwrap();
        assert!(workout.progression_is_fallback());
        assert_eq!(progression.sets, "4");
        assert_eq!(progression.suggested_weight, "140 lbs");
    }

    #[test]
    fn test_stale_assist_response_is_discarded() {
        let (mut workout, _clock) = start(vec![squat(), plank()]);
        let request = workout.begin_assist(AssistPurpose::Description).unwrap();
        workout.next_exercise().unwrap();

        workout.apply_assist(AssistResponse::for_request(
            &request,
            AssistPayload::Description(Some("Squat cues".to_string())),
        ));
        assert_eq!(workout.description(), None);
        assert!(workout.begin_assist(AssistPurpose::Description).is_some());
    }
}
