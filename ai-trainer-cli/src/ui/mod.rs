// Terminal UI for the active workout, using ratatui

mod app;
mod screen;
mod widgets;

pub use app::{App, Mode};
pub use screen::{persist_workout, WorkoutScreen};
pub use widgets::format_clock;
