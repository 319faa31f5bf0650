use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

use super::clock::Clock;
use crate::audio::{play_best_effort, Chime, Cue};

/// Seconds remaining at which the one-shot warning fires
pub const WARNING_THRESHOLD_SECONDS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Warning,
    Completed,
}

/// Restartable countdown.
///
/// While running, the remaining time is always derived from an absolute
/// deadline (`target_end - now`) rather than decremented per tick, so the
/// countdown does not drift and catches up after the process has been
/// suspended. Each `start` yields at most one `Warning` and exactly one
/// `Completed` from [`Timer::tick`]; `stop` guarantees neither fires later.
pub struct Timer {
    clock: Arc<dyn Clock>,
    chime: Arc<dyn Chime>,
    duration: u32,
    remaining: u32,
    running: bool,
    target_end: Option<DateTime<Utc>>,
    warned: bool,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("running", &self.running)
            .field("target_end", &self.target_end)
            .field("warned", &self.warned)
            .finish()
    }
}

impl Timer {
    pub fn new(clock: Arc<dyn Clock>, chime: Arc<dyn Chime>) -> Self {
        Self {
            clock,
            chime,
            duration: 0,
            remaining: 0,
            running: false,
            target_end: None,
            warned: false,
        }
    }

    pub fn start(&mut self, seconds: u32) {
        let now = self.clock.now();
        self.duration = seconds;
        self.remaining = seconds;
        self.target_end = Some(now + Duration::seconds(seconds as i64));
        self.running = true;
        self.warned = false;
        tracing::debug!("Timer started for {}s", seconds);
    }

    /// Stop without firing anything. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!("Timer stopped with {}s left", self.remaining());
        }
        self.remaining = self.remaining();
        self.running = false;
        self.target_end = None;
    }

    pub fn reset(&mut self, seconds: u32) {
        self.stop();
        self.duration = seconds;
        self.remaining = seconds;
        self.warned = false;
    }

    /// Re-arm against a deadline recovered from storage.
    /// Returns false, leaving the timer stopped, if the deadline has passed.
    pub fn resume_until(&mut self, target_end: DateTime<Utc>, duration: u32) -> bool {
        self.duration = duration;
        self.warned = false;

        let left = self.seconds_until(target_end);
        if left <= 0 {
            self.remaining = 0;
            self.running = false;
            self.target_end = None;
            return false;
        }

        self.remaining = left as u32;
        self.target_end = Some(target_end);
        self.running = true;
        true
    }

    /// Recompute remaining time and report a warning or completion
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        let target_end = self.target_end?;
        let left = self.seconds_until(target_end);

        if left <= 0 {
            self.remaining = 0;
            self.running = false;
            self.target_end = None;
            play_best_effort(self.chime.as_ref(), Cue::Completed);
            return Some(TimerEvent::Completed);
        }

        self.remaining = left as u32;
        if left <= WARNING_THRESHOLD_SECONDS && !self.warned {
            self.warned = true;
            play_best_effort(self.chime.as_ref(), Cue::Warning);
            return Some(TimerEvent::Warning);
        }

        None
    }

    /// Remaining seconds; live while running, never negative
    pub fn remaining(&self) -> u32 {
        match (self.running, self.target_end) {
            (true, Some(target_end)) => self.seconds_until(target_end).max(0) as u32,
            _ => self.remaining,
        }
    }

    /// Seconds elapsed since the last start, clamped at zero
    pub fn elapsed(&self) -> u32 {
        self.duration.saturating_sub(self.remaining())
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn target_end(&self) -> Option<DateTime<Utc>> {
        self.target_end
    }

    fn seconds_until(&self, target_end: DateTime<Utc>) -> i64 {
        let millis = (target_end - self.clock.now()).num_milliseconds();
        (millis as f64 / 1000.0).round() as i64
    }
}
