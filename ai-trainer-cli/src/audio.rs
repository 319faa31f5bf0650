// Audible cues for timer warnings and completions. Playback is best-effort:
// a failing backend is logged once and never affects timer semantics.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A few seconds remain
    Warning,
    /// The countdown reached zero
    Completed,
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Audio playback failed: {0}")]
    Playback(#[from] io::Error),
}

pub trait Chime: Send + Sync {
    fn play(&self, cue: Cue) -> Result<(), AudioError>;
}

/// Play a cue, swallowing failures
pub fn play_best_effort(chime: &dyn Chime, cue: Cue) {
    if let Err(e) = chime.play(cue) {
        tracing::warn!("Could not play {:?} cue: {}", cue, e);
    }
}

/// Rings the terminal bell: once for a warning, twice on completion
#[derive(Debug, Default)]
pub struct TerminalBell {
    failure_logged: AtomicBool,
}

impl TerminalBell {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chime for TerminalBell {
    fn play(&self, cue: Cue) -> Result<(), AudioError> {
        let bells: &[u8] = match cue {
            Cue::Warning => b"\x07",
            Cue::Completed => b"\x07\x07",
        };

        let mut stdout = io::stdout();
        let result = stdout.write_all(bells).and_then(|_| stdout.flush());

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                // Only surface the first failure; a missing tty stays missing
                if self.failure_logged.swap(true, Ordering::Relaxed) {
                    Ok(())
                } else {
                    Err(AudioError::Playback(e))
                }
            }
        }
    }
}

/// Used when sound is disabled in config
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Chime for Silent {
    fn play(&self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Chime for Broken {
        fn play(&self, _cue: Cue) -> Result<(), AudioError> {
            Err(AudioError::Unavailable("no device".to_string()))
        }
    }

    #[test]
    fn test_best_effort_swallows_failures() {
        play_best_effort(&Broken, Cue::Completed);
        play_best_effort(&Silent, Cue::Warning);
    }

    #[test]
    fn test_silent_always_succeeds() {
        assert!(Silent.play(Cue::Completed).is_ok());
    }
}
