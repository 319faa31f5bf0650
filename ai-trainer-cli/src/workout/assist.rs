use std::collections::HashSet;

use crate::models::{Exercise, BODYWEIGHT};

/// The three AI-backed affordances of the workout screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssistPurpose {
    Description,
    Alternatives,
    Progression,
}

impl AssistPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            AssistPurpose::Description => "description",
            AssistPurpose::Alternatives => "alternatives",
            AssistPurpose::Progression => "progression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistStatus {
    /// No connectivity; the affordance is disabled
    Offline,
    Idle,
    Loading,
    Ready,
    /// The last request failed; may be retried
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistQuery {
    Description {
        name: String,
    },
    Alternatives {
        exercise: Exercise,
        other_names: Vec<String>,
    },
    Progression {
        exercise: Exercise,
        last_weight: String,
    },
}

/// A fetch the caller should run off the state machine
#[derive(Debug, Clone, PartialEq)]
pub struct AssistRequest {
    pub exercise_index: usize,
    pub exercise_name: String,
    pub query: AssistQuery,
}

impl AssistRequest {
    pub fn purpose(&self) -> AssistPurpose {
        match self.query {
            AssistQuery::Description { .. } => AssistPurpose::Description,
            AssistQuery::Alternatives { .. } => AssistPurpose::Alternatives,
            AssistQuery::Progression { .. } => AssistPurpose::Progression,
        }
    }
}

/// Outcome of a fetch. Failures are carried as `None` / empty, never as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistPayload {
    Description(Option<String>),
    Alternatives(Vec<Exercise>),
    Progression(Option<Exercise>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistResponse {
    pub exercise_index: usize,
    pub exercise_name: String,
    pub payload: AssistPayload,
}

impl AssistResponse {
    pub fn purpose(&self) -> AssistPurpose {
        match self.payload {
            AssistPayload::Description(_) => AssistPurpose::Description,
            AssistPayload::Alternatives(_) => AssistPurpose::Alternatives,
            AssistPayload::Progression(_) => AssistPurpose::Progression,
        }
    }

    pub fn for_request(request: &AssistRequest, payload: AssistPayload) -> Self {
        Self {
            exercise_index: request.exercise_index,
            exercise_name: request.exercise_name.clone(),
            payload,
        }
    }

    /// Response for a request that could not be served at all
    pub fn unavailable(request: &AssistRequest) -> Self {
        let payload = match request.purpose() {
            AssistPurpose::Description => AssistPayload::Description(None),
            AssistPurpose::Alternatives => AssistPayload::Alternatives(Vec::new()),
            AssistPurpose::Progression => AssistPayload::Progression(None),
        };
        Self::for_request(request, payload)
    }
}

/// Connectivity and in-flight bookkeeping. At most one request per purpose
/// is outstanding at a time.
#[derive(Debug, Clone)]
pub struct AssistTracker {
    online: bool,
    in_flight: HashSet<AssistPurpose>,
    unavailable: HashSet<AssistPurpose>,
}

impl AssistTracker {
    pub fn new(online: bool) -> Self {
        Self {
            online,
            in_flight: HashSet::new(),
            unavailable: HashSet::new(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            tracing::info!("Assist connectivity changed: online={}", online);
        }
        self.online = online;
    }

    /// Claim the slot for `purpose`. False when offline or already in flight.
    pub fn try_begin(&mut self, purpose: AssistPurpose) -> bool {
        if !self.online {
            return false;
        }
        if !self.in_flight.insert(purpose) {
            tracing::debug!("Suppressed duplicate {} request", purpose.label());
            return false;
        }
        self.unavailable.remove(&purpose);
        true
    }

    pub fn finish(&mut self, purpose: AssistPurpose, succeeded: bool) {
        self.in_flight.remove(&purpose);
        if succeeded {
            self.unavailable.remove(&purpose);
        } else {
            self.unavailable.insert(purpose);
        }
    }

    pub fn is_in_flight(&self, purpose: AssistPurpose) -> bool {
        self.in_flight.contains(&purpose)
    }

    pub fn is_unavailable(&self, purpose: AssistPurpose) -> bool {
        self.unavailable.contains(&purpose)
    }

    /// Forget failures when moving to another exercise
    pub fn clear_failures(&mut self) {
        self.unavailable.clear();
    }
}

/// Harder variant without added load: one extra set, same weight
pub fn local_progression(exercise: &Exercise, last_weight: &str) -> Exercise {
    let weight = if last_weight.trim().is_empty() {
        exercise.suggested_weight.clone()
    } else {
        last_weight.to_string()
    };

    Exercise {
        sets: (exercise.set_count() + 1).to_string(),
        suggested_weight: if weight.is_empty() {
            BODYWEIGHT.to_string()
        } else {
            weight
        },
        ..exercise.clone()
    }
}
