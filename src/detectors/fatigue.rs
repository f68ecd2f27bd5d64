use serde::{Deserialize, Serialize};

use crate::config::FatigueConfig;
use crate::types::{clamp_unit, TimeOfDay};

#[derive(Debug, Clone)]
pub struct FatigueInput {
    pub session_duration_seconds: f64,
    /// Failed attempts in the recent performance window.
    pub recent_errors: usize,
    pub time_of_day: TimeOfDay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueSignal {
    pub fatigue: f64,
    pub motivation: f64,
    pub reduce_difficulty: bool,
    pub suggest_break: bool,
}

/// Session-load fatigue estimate. Motivation is derived as its floor-bounded
/// complement rather than tracked independently.
pub struct FatigueDetector {
    config: FatigueConfig,
}

impl FatigueDetector {
    pub fn new(config: FatigueConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, input: &FatigueInput) -> FatigueSignal {
        let session_component =
            self.config.session_weight * (input.session_duration_seconds.max(0.0) / 3600.0);
        let error_component = (input.recent_errors as f64 * self.config.error_weight)
            .min(self.config.error_cap);
        let time_adjustment = match input.time_of_day {
            TimeOfDay::Evening | TimeOfDay::Night => self.config.evening_adjustment,
            TimeOfDay::Morning => self.config.morning_adjustment,
            TimeOfDay::Afternoon => 0.0,
        };

        let fatigue = clamp_unit(session_component + error_component + time_adjustment);
        let motivation = (1.0 - fatigue).max(self.config.motivation_floor);

        FatigueSignal {
            fatigue,
            motivation,
            reduce_difficulty: fatigue > self.config.reduce_threshold,
            suggest_break: fatigue >= self.config.break_threshold,
        }
    }
}

impl Default for FatigueDetector {
    fn default() -> Self {
        Self::new(FatigueConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_morning_session_low_fatigue() {
        let detector = FatigueDetector::default();
        let signal = detector.detect(&FatigueInput {
            session_duration_seconds: 300.0,
            recent_errors: 0,
            time_of_day: TimeOfDay::Morning,
        });
        assert!(signal.fatigue < 0.1);
        assert!(!signal.reduce_difficulty);
        assert!(signal.motivation > 0.9);
    }

    #[test]
    fn test_long_evening_session_with_errors_crosses_threshold() {
        // Scenario from the fatigue-override case: 3700 s, 4 errors, evening.
        let detector = FatigueDetector::default();
        let signal = detector.detect(&FatigueInput {
            session_duration_seconds: 3700.0,
            recent_errors: 4,
            time_of_day: TimeOfDay::Evening,
        });
        assert!(signal.fatigue >= 0.7);
        assert!(signal.reduce_difficulty);
        assert!(signal.suggest_break);
    }

    #[test]
    fn test_error_component_is_capped() {
        let detector = FatigueDetector::default();
        let few = detector.detect(&FatigueInput {
            session_duration_seconds: 0.0,
            recent_errors: 3,
            time_of_day: TimeOfDay::Afternoon,
        });
        let many = detector.detect(&FatigueInput {
            session_duration_seconds: 0.0,
            recent_errors: 30,
            time_of_day: TimeOfDay::Afternoon,
        });
        assert!((many.fatigue - 0.3).abs() < 1e-10);
        assert!(few.fatigue <= many.fatigue);
    }

    #[test]
    fn test_motivation_has_floor() {
        let detector = FatigueDetector::default();
        let signal = detector.detect(&FatigueInput {
            session_duration_seconds: 3600.0 * 4.0,
            recent_errors: 10,
            time_of_day: TimeOfDay::Night,
        });
        assert_eq!(signal.fatigue, 1.0);
        assert!((signal.motivation - 0.3).abs() < 1e-10);
    }

    #[test]
    fn test_fatigue_bounded() {
        let detector = FatigueDetector::default();
        let signal = detector.detect(&FatigueInput {
            session_duration_seconds: -100.0,
            recent_errors: 0,
            time_of_day: TimeOfDay::Morning,
        });
        assert!(signal.fatigue >= 0.0 && signal.fatigue <= 1.0);
    }
}
