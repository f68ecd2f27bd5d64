//! Cycle-result invariant checks.
//!
//! Runs after every cycle and reports violations through `tracing::warn!`.
//! Violations indicate a heuristic bug, not a user-facing failure, so the
//! cycle result is still returned unchanged.

use tracing::warn;

use crate::engine::CycleResult;
use crate::types::{DifficultyProfile, MAX_LEVEL, MIN_LEVEL};

pub struct InvariantMonitor;

impl InvariantMonitor {
    /// Returns the list of violated invariants, empty when the cycle is sound.
    pub fn check(profile: &DifficultyProfile, result: &CycleResult) -> Vec<String> {
        let mut violations = Vec::new();

        check_level(&mut violations, "profile.current_level", profile.current_level);
        check_level(&mut violations, "profile.optimal_level", profile.optimal_level);
        check_unit(&mut violations, "profile.confidence", profile.confidence);
        check_unit(&mut violations, "profile.success_rate", profile.success_rate);
        check_unit(&mut violations, "profile.fatigue_level", profile.fatigue_level);
        check_unit(&mut violations, "profile.motivation_level", profile.motivation_level);
        check_unit(&mut violations, "profile.session_quality", profile.session_quality);

        check_unit(&mut violations, "analysis.success_rate", result.analysis.success_rate);
        check_unit(&mut violations, "analysis.consistency", result.analysis.consistency);
        check_finite(&mut violations, "analysis.average_attempts", result.analysis.average_attempts);
        check_finite(
            &mut violations,
            "analysis.average_time_seconds",
            result.analysis.average_time_seconds,
        );

        check_unit(&mut violations, "flow.flow_score", result.flow.flow_score);
        if !(MIN_LEVEL as f64..=MAX_LEVEL as f64).contains(&result.flow.skill_estimate) {
            violations.push(format!(
                "flow.skill_estimate {} outside [1, 10]",
                result.flow.skill_estimate
            ));
        }
        check_unit(&mut violations, "plateau.score", result.plateau.score);
        check_unit(&mut violations, "plateau.confidence", result.plateau.confidence);
        check_unit(&mut violations, "fatigue.fatigue", result.fatigue.fatigue);
        check_unit(&mut violations, "fatigue.motivation", result.fatigue.motivation);
        check_unit(&mut violations, "frustration.score", result.frustration.score);
        check_unit(
            &mut violations,
            "engagement.engagement_level",
            result.engagement.engagement_level,
        );

        for action in result
            .decision
            .immediate
            .iter()
            .chain(result.decision.deferred.iter())
        {
            check_unit(&mut violations, "action.confidence", action.confidence);
            check_unit(&mut violations, "action.intensity", action.intensity);
        }

        for violation in &violations {
            warn!(user = profile.user_id.as_str(), %violation, "cycle invariant violated");
        }
        violations
    }
}

fn check_unit(violations: &mut Vec<String>, name: &str, value: f64) {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        violations.push(format!("{name} {value} outside [0, 1]"));
    }
}

fn check_level(violations: &mut Vec<String>, name: &str, level: i32) {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        violations.push(format!("{name} {level} outside [1, 10]"));
    }
}

fn check_finite(violations: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        violations.push(format!("{name} {value} is not a non-negative finite number"));
    }
}
