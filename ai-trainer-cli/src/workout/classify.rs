use crate::models::Exercise;

use super::duration::parse_duration;

/// Name fragments identifying cardio equipment or cardio movements
pub const CARDIO_KEYWORDS: &[&str] = &[
    "treadmill",
    "elliptical",
    "bike",
    "biking",
    "cycling",
    "spin",
    "rowing machine",
    "rower",
    "stair climber",
    "stairmaster",
    "stepper",
    "jump rope",
    "skipping",
    "ski erg",
    "airdyne",
    "run",
    "running",
    "jog",
    "jogging",
    "sprint",
    "sprints",
    "swim",
    "swimming",
];

/// How the current exercise should be rendered and recorded.
/// Derived from the exercise on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseProfile {
    pub is_cardio: bool,
    pub is_timed: bool,
    pub weight_applicable: bool,
    /// Target duration of one set for timed exercises
    pub duration_seconds: Option<u32>,
}

/// Keyword match on whole words, so "Crunch" is not mistaken for "run"
pub fn is_cardio_name(name: &str) -> bool {
    let words: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let padded = format!(" {} ", words.split_whitespace().collect::<Vec<_>>().join(" "));

    CARDIO_KEYWORDS
        .iter()
        .any(|keyword| padded.contains(&format!(" {keyword} ")))
}

pub fn classify(exercise: &Exercise) -> ExerciseProfile {
    let duration_seconds = parse_duration(&exercise.reps);
    let is_timed = duration_seconds.is_some();
    let is_cardio = is_cardio_name(&exercise.name);

    ExerciseProfile {
        is_cardio,
        is_timed,
        weight_applicable: !exercise.is_bodyweight() && !is_timed && !is_cardio,
        duration_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treadmill_is_cardio_and_timed() {
        let run = Exercise::new("Treadmill Run", "1", "20 min", 0, "N/A", Some(0));
        let profile = classify(&run);

        assert!(profile.is_cardio);
        assert!(profile.is_timed);
        assert!(!profile.weight_applicable);
        assert_eq!(profile.duration_seconds, Some(1200));
    }

    #[test]
    fn test_loaded_lift_is_weight_applicable() {
        let squat = Exercise::new("Back Squat", "3", "8-12", 90, "135 lbs", Some(120));
        let profile = classify(&squat);

        assert!(!profile.is_cardio);
        assert!(!profile.is_timed);
        assert!(profile.weight_applicable);
    }

    #[test]
    fn test_bodyweight_is_not_weight_applicable() {
        let pushup = Exercise::new("Push-up", "3", "15", 60, "Bodyweight", Some(60));
        assert!(!classify(&pushup).weight_applicable);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert!(is_cardio_name("Incline Treadmill Walk"));
        assert!(is_cardio_name("Stationary Bike Intervals"));
        assert!(is_cardio_name("Rowing Machine"));
        assert!(!is_cardio_name("Bicycle Crunch"));
        assert!(!is_cardio_name("Sprinter Lunge"));
    }

    #[test]
    fn test_timed_hold_with_load() {
        let carry = Exercise::new("Farmer Hold", "3", "30-45 sec", 60, "50 lbs", Some(60));
        let profile = classify(&carry);

        assert!(profile.is_timed);
        assert!(!profile.weight_applicable);
        assert_eq!(profile.duration_seconds, Some(45));
    }
}
