use crossterm::event::KeyCode;

use crate::models::Effort;
use crate::workout::{
    ActiveWorkout, AssistPurpose, AssistRequest, AssistResponse, AssistStatus, SetField,
    WorkoutError, WorkoutPhase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Alternatives are listed; 1/2 picks one
    ChoosingAlternative,
    /// Waiting for y/n on ending the workout
    ConfirmEnd,
    Help,
}

/// Screen state around an [`ActiveWorkout`]: which set and field has
/// focus, overlays, and the status line. Holds no terminal or storage.
pub struct App {
    pub workout: ActiveWorkout,
    pub focused_set: usize,
    pub field: SetField,
    pub mode: Mode,
    pub should_quit: bool,
    pub message: Option<String>,
    pub weight_unit: String,
    pub show_description: bool,
    awaiting_alternatives: bool,
    last_exercise: Option<usize>,
}

impl App {
    pub fn new(workout: ActiveWorkout, weight_unit: impl Into<String>) -> Self {
        let mut app = Self {
            workout,
            focused_set: 0,
            field: SetField::Reps,
            mode: Mode::Normal,
            should_quit: false,
            message: None,
            weight_unit: weight_unit.into(),
            show_description: false,
            awaiting_alternatives: false,
            last_exercise: None,
        };
        app.sync_focus();
        app
    }

    /// Handle keyboard input. Returns fetches the caller should start.
    pub fn handle_key(&mut self, key: KeyCode) -> Vec<AssistRequest> {
        let mut requests = Vec::new();

        if self.mode == Mode::Help {
            if matches!(key, KeyCode::Char('?') | KeyCode::Esc) {
                self.mode = Mode::Normal;
            }
            return requests;
        }

        if self.workout.phase().is_complete() {
            match key {
                KeyCode::Char('q') | KeyCode::Enter | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('a') => self.rate(Effort::Easy),
                KeyCode::Char('g') => self.rate(Effort::Good),
                KeyCode::Char('h') => self.rate(Effort::Hard),
                _ => {}
            }
            return requests;
        }

        if self.workout.pending().is_some() {
            match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let result = self.workout.confirm_pending();
                    self.report(result);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    let result = self.workout.decline_pending();
                    self.report(result);
                }
                _ => {}
            }
            self.sync_focus();
            return requests;
        }

        match self.mode {
            Mode::ConfirmEnd => {
                if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    let result = self.workout.end_workout();
                    self.report(result);
                }
                self.mode = Mode::Normal;
                return requests;
            }
            Mode::ChoosingAlternative => {
                match key {
                    KeyCode::Char(c @ ('1' | '2')) => {
                        let choice = if c == '1' { 0 } else { 1 };
                        if let Some(alt) = self.workout.alternatives().get(choice).cloned() {
                            let result = self.workout.request_swap(alt);
                            self.report(result);
                        }
                        self.mode = Mode::Normal;
                    }
                    KeyCode::Esc => self.mode = Mode::Normal,
                    _ => {}
                }
                return requests;
            }
            _ => {}
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }

            KeyCode::Char('?') => {
                self.mode = Mode::Help;
            }

            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.type_char(c),

            KeyCode::Backspace => self.backspace(),

            KeyCode::Tab => self.toggle_field(),

            KeyCode::Up => {
                self.focused_set = self.focused_set.saturating_sub(1);
            }

            KeyCode::Down => {
                let sets = self.current_set_count();
                if self.focused_set + 1 < sets {
                    self.focused_set += 1;
                }
            }

            KeyCode::Enter => self.enter(),

            KeyCode::Char(' ') => {
                self.workout.skip_rest();
            }

            KeyCode::Char('a') => self.rate(Effort::Easy),
            KeyCode::Char('g') => self.rate(Effort::Good),
            KeyCode::Char('h') => self.rate(Effort::Hard),

            KeyCode::Char('n') => {
                let result = self.workout.next_exercise();
                self.report(result);
            }

            KeyCode::Char('x') => {
                let result = self.workout.request_skip_exercise();
                self.report(result);
            }

            KeyCode::Char('w') => {
                if self.workout.alternatives().is_empty() {
                    if let Some(request) = self.assist(AssistPurpose::Alternatives) {
                        self.awaiting_alternatives = true;
                        requests.push(request);
                    }
                } else {
                    self.mode = Mode::ChoosingAlternative;
                }
            }

            KeyCode::Char('p') => match self.workout.progression().cloned() {
                Some(progression) => {
                    let result = self.workout.request_swap(progression);
                    self.report(result);
                }
                None => requests.extend(self.assist(AssistPurpose::Progression)),
            },

            KeyCode::Char('d') => {
                if self.workout.description().is_some() {
                    self.show_description = !self.show_description;
                } else if let Some(request) = self.assist(AssistPurpose::Description) {
                    self.show_description = true;
                    requests.push(request);
                }
            }

            KeyCode::Char('l') => {
                let set = self.focused_set;
                match self.workout.use_last_weight(set) {
                    Ok(Some(weight)) => {
                        self.field = SetField::Weight;
                        self.message = Some(format!("Weight set to {} {}", weight, self.weight_unit));
                    }
                    Ok(None) => self.message = Some("No previous weight".to_string()),
                    Err(e) => self.message = Some(e.to_string()),
                }
            }

            KeyCode::Char('e') => {
                self.mode = Mode::ConfirmEnd;
            }

            _ => {}
        }

        self.sync_focus();
        requests
    }

    pub fn tick(&mut self) -> bool {
        let changed = self.workout.tick();
        if changed {
            self.sync_focus();
        }
        changed
    }

    pub fn apply_assist(&mut self, response: AssistResponse) {
        let purpose = response.purpose();
        self.workout.apply_assist(response);

        if purpose == AssistPurpose::Alternatives && self.awaiting_alternatives {
            self.awaiting_alternatives = false;
            if self.workout.alternatives().is_empty() {
                self.message = Some("Alternatives unavailable".to_string());
            } else {
                self.mode = Mode::ChoosingAlternative;
            }
        }
    }

    pub fn set_online(&mut self, online: bool) {
        self.workout.set_online(online);
    }

    /// Human-readable assist state, for the side panel
    pub fn assist_label(&self, purpose: AssistPurpose) -> &'static str {
        match self.workout.assist_status(purpose) {
            AssistStatus::Offline => "offline, connect to retry",
            AssistStatus::Unavailable => "unavailable, connect to retry",
            AssistStatus::Loading => "loading...",
            AssistStatus::Ready => "ready",
            AssistStatus::Idle => "",
        }
    }

    fn assist(&mut self, purpose: AssistPurpose) -> Option<AssistRequest> {
        let request = self.workout.begin_assist(purpose);
        if request.is_none() {
            self.message = Some(match self.workout.assist_status(purpose) {
                AssistStatus::Offline => format!("{} unavailable offline", capitalize(purpose.label())),
                AssistStatus::Loading => format!("Already fetching {}", purpose.label()),
                _ => format!("Cannot fetch {} right now", purpose.label()),
            });
        }
        request
    }

    fn enter(&mut self) {
        let timed = self
            .workout
            .current_profile()
            .map(|p| p.is_timed)
            .unwrap_or(false);

        match self.workout.phase() {
            WorkoutPhase::RunningDurationTimer { .. } => {
                let result = self.workout.stop_timed_set();
                self.report(result);
            }
            _ if timed => match self.workout.start_timed_set() {
                Ok(set) => self.focused_set = set,
                Err(e) => self.message = Some(e.to_string()),
            },
            _ => {
                let result = self.workout.complete_set(self.focused_set);
                self.report(result);
                self.focused_set = self.next_open_set();
                self.field = SetField::Reps;
            }
        }
    }

    fn rate(&mut self, effort: Effort) {
        match self.workout.record_effort(effort) {
            Ok(()) => self.message = Some(format!("Effort: {}", effort)),
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn type_char(&mut self, c: char) {
        let Some(current) = self.field_value() else {
            return;
        };
        let raw = format!("{}{}", current, c);
        self.write_field(&raw);
    }

    fn backspace(&mut self) {
        let Some(mut current) = self.field_value() else {
            return;
        };
        current.pop();
        self.write_field(&current);
    }

    fn write_field(&mut self, raw: &str) {
        let set = self.focused_set;
        let result = match self.field {
            SetField::Reps => self.workout.enter_reps(set, raw),
            SetField::Weight => self.workout.enter_weight(set, raw),
        };
        if let Err(e) = result {
            self.message = Some(e.to_string());
        }
    }

    fn field_value(&self) -> Option<String> {
        let set = self.workout.current_record()?.sets.get(self.focused_set)?;
        Some(match self.field {
            SetField::Reps => set.reps.clone(),
            SetField::Weight => set.weight.clone(),
        })
    }

    fn toggle_field(&mut self) {
        let weighted = self
            .workout
            .current_profile()
            .map(|p| p.weight_applicable)
            .unwrap_or(false);

        self.field = match self.field {
            SetField::Reps if weighted => SetField::Weight,
            _ => SetField::Reps,
        };
    }

    fn current_set_count(&self) -> usize {
        self.workout
            .current_record()
            .map(|r| r.sets.len())
            .unwrap_or(0)
    }

    fn next_open_set(&self) -> usize {
        self.workout
            .current_record()
            .and_then(|r| r.sets.iter().position(|s| !s.completed))
            .unwrap_or_else(|| self.current_set_count().saturating_sub(1))
    }

    /// Reset focus when the exercise on screen changes
    fn sync_focus(&mut self) {
        let current = self.workout.current_index();
        if current != self.last_exercise {
            self.last_exercise = current;
            self.focused_set = self.next_open_set();
            self.field = SetField::Reps;
            self.show_description = false;
            self.awaiting_alternatives = false;
            if self.mode == Mode::ChoosingAlternative {
                self.mode = Mode::Normal;
            }
        }
    }

    fn report<T>(&mut self, result: Result<T, WorkoutError>) {
        match result {
            Ok(_) => self.message = None,
            Err(e) => self.message = Some(e.to_string()),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
