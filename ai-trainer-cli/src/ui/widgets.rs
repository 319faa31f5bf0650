use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Widget, Wrap},
};

use super::app::{App, Mode};
use crate::models::CompletedWorkoutSession;
use crate::workout::{history, AssistPurpose, PendingAction, SetField, WorkoutPhase};

/// Seconds as m:ss
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

/// Exercise name, prescription and position in the day
pub fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let workout = &app.workout;
    let day = workout.day();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" 🏋 {} ", day.day))
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = Vec::new();

    match (workout.current_index(), workout.current_exercise()) {
        (Some(index), Some(exercise)) => {
            let upcoming = matches!(workout.phase(), WorkoutPhase::RestingBetweenExercises { .. });
            let mut title = vec![
                Span::styled(
                    if upcoming { "Up next: " } else { "" },
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    exercise.name.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({}/{})", index + 1, day.exercises.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ];

            if let Some(profile) = workout.current_profile() {
                if profile.is_cardio {
                    title.push(Span::styled(" [cardio]", Style::default().fg(Color::Magenta)));
                }
                if profile.is_timed {
                    title.push(Span::styled(" [timed]", Style::default().fg(Color::Magenta)));
                }
            }
            lines.push(Line::from(title));

            lines.push(Line::from(vec![
                label("Sets: "),
                Span::raw(exercise.sets.clone()),
                label("   Reps: "),
                Span::raw(exercise.reps.clone()),
                label("   Rest: "),
                Span::raw(format!("{}s", exercise.rest)),
                label("   Load: "),
                Span::raw(exercise.suggested_weight.clone()),
            ]));
        }
        _ => lines.push(Line::from(Span::styled(
            "Workout complete",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))),
    }

    if !day.goal.is_empty() {
        lines.push(Line::from(vec![label("Goal: "), Span::raw(day.goal.clone())]));
    }

    Paragraph::new(lines).render(inner, buf);
}

/// Set table with entry fields and the last-weight hint
pub fn render_sets(area: Rect, buf: &mut Buffer, app: &App) {
    let workout = &app.workout;
    let editing = matches!(
        workout.phase(),
        WorkoutPhase::EnteringSets { .. }
            | WorkoutPhase::RestingBetweenSets { .. }
            | WorkoutPhase::RunningDurationTimer { .. }
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sets ")
        .border_style(Style::default().fg(if editing { Color::Cyan } else { Color::Gray }));

    let Some(record) = workout.current_record().filter(|_| editing) else {
        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(Line::from(Span::styled(
            "Resting before the next exercise",
            Style::default().fg(Color::DarkGray),
        )))
        .render(inner, buf);
        return;
    };

    let weighted = workout
        .current_profile()
        .map(|p| p.weight_applicable)
        .unwrap_or(false);
    let timing = match workout.phase() {
        WorkoutPhase::RunningDurationTimer { set_index, .. } => Some(set_index),
        _ => None,
    };

    let mut items: Vec<ListItem> = record
        .sets
        .iter()
        .enumerate()
        .map(|(i, set)| {
            let focused = i == app.focused_set;
            let field_style = |field: SetField| {
                if focused && app.field == field {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                }
            };

            let marker = if set.completed {
                Span::styled("✓ ", Style::default().fg(Color::Green))
            } else if timing == Some(i) {
                Span::styled("⏱ ", Style::default().fg(Color::Yellow))
            } else if focused {
                Span::styled("▶ ", Style::default().fg(Color::Cyan))
            } else {
                Span::raw("  ")
            };

            let mut spans = vec![
                marker,
                Span::styled(format!("Set {:<3}", i + 1), Style::default().fg(Color::Gray)),
                label("reps "),
                Span::styled(format!("[{:>4}]", set.reps), field_style(SetField::Reps)),
            ];

            if weighted {
                spans.push(label("  weight "));
                spans.push(Span::styled(
                    format!("[{:>6}]", set.weight),
                    field_style(SetField::Weight),
                ));
                spans.push(Span::styled(
                    format!(" {}", app.weight_unit),
                    Style::default().fg(Color::DarkGray),
                ));

                if focused && set.weight.is_empty() {
                    if let Some(hint) = workout.last_weight_hint(i) {
                        spans.push(Span::styled(
                            format!("  last: {} (l)", hint),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    if let Some(effort) = record.effort {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Line::from(vec![
            label("Effort: "),
            Span::styled(effort.to_string(), Style::default().fg(Color::Yellow)),
        ])));
    }

    List::new(items).block(block).render(area, buf);
}

/// Rest or exercise countdown
pub fn render_timer(area: Rect, buf: &mut Buffer, app: &App) {
    let workout = &app.workout;
    let day = workout.day();

    let (title, remaining, duration, color) = match workout.phase() {
        WorkoutPhase::RunningDurationTimer {
            duration_seconds, ..
        } => (
            " ⏱ Timed set ",
            workout.exercise_timer_remaining(),
            duration_seconds,
            Color::Yellow,
        ),
        WorkoutPhase::RestingBetweenSets { exercise_index } => (
            " 😮‍💨 Rest ",
            workout.rest_remaining(),
            day.exercises[exercise_index].rest,
            Color::Green,
        ),
        WorkoutPhase::RestingBetweenExercises {
            next_exercise_index,
        } => (
            " 😮‍💨 Rest before next exercise ",
            workout.rest_remaining(),
            day.exercises[next_exercise_index.saturating_sub(1)]
                .rest_after_exercise
                .unwrap_or(0),
            Color::Green,
        ),
        _ => {
            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Timer ")
                .border_style(Style::default().fg(Color::Gray));
            let inner = block.inner(area);
            block.render(area, buf);

            let hint = match workout.current_profile() {
                Some(p) if p.is_timed => "Enter starts the timer",
                _ => "Enter completes the focused set",
            };
            Paragraph::new(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )))
            .render(inner, buf);
            return;
        }
    };

    let ratio = if duration == 0 {
        0.0
    } else {
        (remaining as f64 / duration as f64).clamp(0.0, 1.0)
    };
    let color = if remaining <= 5 { Color::Red } else { color };

    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(color)),
        )
        .gauge_style(Style::default().fg(color).bg(Color::DarkGray))
        .ratio(ratio)
        .label(format_clock(remaining))
        .render(area, buf);
}

/// Last time, description, alternatives and progression
pub fn render_assist(area: Rect, buf: &mut Buffer, app: &App) {
    let workout = &app.workout;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(if workout.is_online() {
            " 🤖 Coach "
        } else {
            " 🤖 Coach (offline) "
        })
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    block.render(area, buf);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let status = |text: &'static str| {
        Line::from(Span::styled(
            format!("  {}", text),
            Style::default().fg(Color::DarkGray),
        ))
    };

    let mut lines = vec![heading("Last time")];
    match workout.last_time() {
        Some((date, exercise)) => lines.push(Line::from(vec![
            Span::styled(
                format!("  {}  ", date.format("%b %d")),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(history::summarize(exercise)),
        ])),
        None => lines.push(status("no history")),
    }

    lines.push(Line::from(""));
    lines.push(heading("Description (d)"));
    match workout.description() {
        Some(text) if app.show_description => lines.push(Line::from(format!("  {}", text))),
        Some(_) => lines.push(status("press d to show")),
        None => lines.push(status(app.assist_label(AssistPurpose::Description))),
    }

    lines.push(Line::from(""));
    lines.push(heading("Alternatives (w)"));
    if workout.alternatives().is_empty() {
        lines.push(status(app.assist_label(AssistPurpose::Alternatives)));
    }
    for (i, alt) in workout.alternatives().iter().enumerate() {
        let style = if app.mode == Mode::ChoosingAlternative {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. {}", i + 1, alt.name), style),
            Span::styled(
                format!("  {} x {} @ {}", alt.sets, alt.reps, alt.suggested_weight),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Progression (p)"));
    match workout.progression() {
        Some(next) => {
            lines.push(Line::from(format!(
                "  {} x {} @ {}",
                next.sets, next.reps, next.suggested_weight
            )));
            if workout.progression_is_fallback() {
                lines.push(status("coach unavailable, one more set suggested"));
            }
        }
        None => lines.push(status(app.assist_label(AssistPurpose::Progression))),
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(inner, buf);
}

/// Recap shown once the session is finalized
pub fn render_summary(area: Rect, buf: &mut Buffer, session: &CompletedWorkoutSession, unit: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" 🎉 Workout complete ")
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![
        Line::from(vec![
            label("Exercises: "),
            Span::styled(
                session.exercises.len().to_string(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            label("   Sets: "),
            Span::styled(
                session.total_sets().to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            label("   Volume: "),
            Span::styled(
                format!("{} {}", history::format_weight(session.total_volume()), unit),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];

    for exercise in &session.exercises {
        let mut spans = vec![
            Span::styled(format!("{:<28}", exercise.name), Style::default().fg(Color::White)),
            Span::raw(history::summarize(exercise)),
        ];
        if let Some(effort) = exercise.effort {
            spans.push(Span::styled(
                format!("  ({})", effort),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Saved to history. a/g/h rates the last exercise, Enter or q exits",
        Style::default().fg(Color::DarkGray),
    )));

    Paragraph::new(lines).render(inner, buf);
}

/// Text for the y/n prompt currently showing, if any
pub fn confirm_prompt(app: &App) -> Option<String> {
    let workout = &app.workout;
    match workout.pending() {
        Some(PendingAction::SkipExercise { exercise_index }) => Some(format!(
            "Skip {}?",
            workout.day().exercises[*exercise_index].name
        )),
        Some(PendingAction::SwapExercise {
            exercise_index,
            replacement,
        }) => Some(format!(
            "Replace {} with {} ({} x {} @ {})?",
            workout.day().exercises[*exercise_index].name,
            replacement.name,
            replacement.sets,
            replacement.reps,
            replacement.suggested_weight
        )),
        None if app.mode == Mode::ConfirmEnd => {
            Some("End the workout now and save what you have?".to_string())
        }
        None => None,
    }
}

pub fn render_confirm_overlay(area: Rect, buf: &mut Buffer, prompt: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(area);
    block.render(area, buf);

    let lines = vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" yes   "),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" no"),
        ]),
    ];

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

/// Render help overlay
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ❓ Help ")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(area);
    block.render(area, buf);

    let section = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Cyan)));

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Sets:"),
        Line::from("  0-9 .    - Type reps or weight"),
        Line::from("  Tab      - Switch reps / weight"),
        Line::from("  ↑/↓      - Choose set"),
        Line::from("  Enter    - Complete set / start or stop timer"),
        Line::from("  l        - Use last weight"),
        Line::from(""),
        section("Flow:"),
        Line::from("  Space    - Skip rest"),
        Line::from("  a/g/h    - Effort easy / good / hard"),
        Line::from("  n        - Next exercise"),
        Line::from("  x        - Skip exercise"),
        Line::from("  e        - End workout"),
        Line::from(""),
        section("Coach:"),
        Line::from("  d        - Description"),
        Line::from("  w        - Alternatives (1/2 to pick)"),
        Line::from("  p        - Progression"),
        Line::from(""),
        section("Other:"),
        Line::from("  ?        - Toggle this help"),
        Line::from("  q        - Quit, keep progress"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or ESC to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    Paragraph::new(help_text).render(inner, buf);
}

/// Render status bar at bottom
pub fn render_status_bar(area: Rect, buf: &mut Buffer, app: &App) {
    let phase = Span::styled(
        format!(" {} ", app.workout.phase().name()),
        Style::default().fg(Color::Black).bg(Color::Cyan),
    );

    let body = match &app.message {
        Some(message) => Span::styled(format!(" {} ", message), Style::default().fg(Color::Yellow)),
        None => Span::styled(
            " Enter: complete | Space: skip rest | a/g/h: effort | n: next | ?: help | q: quit ",
            Style::default().fg(Color::Gray),
        ),
    };

    Paragraph::new(Line::from(vec![phase, body])).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(605), "10:05");
    }
}
