use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::app::{App, Mode};
use super::widgets;
use crate::api::AiClient;
use crate::models::Preferences;
use crate::storage::Storage;
use crate::workout::{ActiveWorkout, AssistRequest, AssistResponse, WorkoutEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Write finished sessions, plan swaps and the resumable snapshot.
///
/// `saved_revision` is the workout revision last written; the snapshot is
/// only rewritten when the workout has changed since.
pub fn persist_workout(
    storage: &Storage,
    workout: &mut ActiveWorkout,
    saved_revision: &mut Option<u64>,
) -> Result<()> {
    for event in workout.drain_events() {
        match event {
            WorkoutEvent::ExerciseReplaced(replacement) => {
                if let Some(plan_id) = workout.plan_id() {
                    storage.apply_replacement(plan_id, &replacement)?;
                }
            }
            WorkoutEvent::SessionFinished(session) => {
                storage.save_session(&session)?;
                storage.clear_active_workout()?;
                tracing::info!("Session {} saved to history", session.id);
            }
            WorkoutEvent::SessionUpdated(session) => {
                storage.save_session(&session)?;
                tracing::debug!("Session {} updated", session.id);
            }
            _ => {}
        }
    }

    if *saved_revision != Some(workout.revision()) {
        if let Some(snapshot) = workout.snapshot() {
            storage.save_active_workout(&snapshot)?;
        }
        *saved_revision = Some(workout.revision());
    }

    Ok(())
}

/// Full-screen workout session: terminal lifecycle, input, timers and
/// background coach requests
pub struct WorkoutScreen {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    storage: Storage,
    client: Arc<AiClient>,
    preferences: Preferences,
    tx: UnboundedSender<AssistResponse>,
    rx: UnboundedReceiver<AssistResponse>,
    saved_revision: Option<u64>,
}

impl WorkoutScreen {
    pub fn new(app: App, storage: Storage, client: Arc<AiClient>, preferences: Preferences) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            app,
            storage,
            client,
            preferences,
            tx,
            rx,
            saved_revision: None,
        })
    }

    /// Run until the user quits or dismisses the summary.
    /// Must be called inside a multi-threaded tokio runtime.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let app = &self.app;
            self.terminal.draw(|f| ui(f, app))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        for request in self.app.handle_key(key.code) {
                            self.dispatch(request);
                        }
                    }
                }
            }

            while let Ok(response) = self.rx.try_recv() {
                self.app.apply_assist(response);
            }

            self.app.tick();
            persist_workout(&self.storage, &mut self.app.workout, &mut self.saved_revision)?;

            if self.app.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// The finished or paused workout, once the screen is done
    pub fn workout(&self) -> &ActiveWorkout {
        &self.app.workout
    }

    fn dispatch(&self, request: AssistRequest) {
        let client = Arc::clone(&self.client);
        let preferences = self.preferences.clone();
        let tx = self.tx.clone();

        tracing::debug!(
            "Fetching {} for {}",
            request.purpose().label(),
            request.exercise_name
        );

        tokio::spawn(async move {
            let response = client.fulfil(&request, &preferences).await;
            // Receiver is gone once the screen closes
            let _ = tx.send(response);
        });
    }

    /// Cleanup terminal on exit
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to restore terminal")?;
        self.terminal.show_cursor().context("Failed to show cursor")?;

        Ok(())
    }
}

impl Drop for WorkoutScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(size);

    widgets::render_header(rows[0], f.buffer_mut(), app);

    match app.workout.completed_session() {
        Some(session) => {
            let body = rows[1].union(rows[2]);
            widgets::render_summary(body, f.buffer_mut(), session, &app.weight_unit);
        }
        None => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(rows[1]);

            widgets::render_sets(columns[0], f.buffer_mut(), app);
            widgets::render_assist(columns[1], f.buffer_mut(), app);
            widgets::render_timer(rows[2], f.buffer_mut(), app);
        }
    }

    widgets::render_status_bar(rows[3], f.buffer_mut(), app);

    if let Some(prompt) = widgets::confirm_prompt(app) {
        let area = centered_rect(50, 25, size);
        widgets::render_confirm_overlay(area, f.buffer_mut(), &prompt);
    }

    if app.mode == Mode::Help {
        let help_area = centered_rect(60, 80, size);
        widgets::render_help_overlay(help_area, f.buffer_mut());
    }
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
