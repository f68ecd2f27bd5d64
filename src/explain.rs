//! Reasoning text for adaptations.
//!
//! Kept apart from decision logic so tests assert on structured
//! [`AdaptationTrigger`] values while hosts still get human-readable prose.

use crate::types::AdaptationTrigger;

pub fn describe(trigger: &AdaptationTrigger) -> String {
    match trigger {
        AdaptationTrigger::FatigueOverride { fatigue } => format!(
            "fatigue level {:.2} exceeds the safe threshold; easing difficulty",
            fatigue
        ),
        AdaptationTrigger::Plateau { score } => format!(
            "performance has plateaued (score {:.2}); raising difficulty to restart progress",
            score
        ),
        AdaptationTrigger::FlowCorrection { skill_estimate, gap } => format!(
            "difficulty is {:.1} levels away from the estimated skill of {:.1}; correcting toward flow",
            gap, skill_estimate
        ),
        AdaptationTrigger::Mastery { success_rate } => format!(
            "sustained mastery at {:.0}% success; increasing challenge",
            success_rate * 100.0
        ),
        AdaptationTrigger::Struggle { success_rate } => format!(
            "success rate has fallen to {:.0}% and is declining; reducing difficulty",
            success_rate * 100.0
        ),
        AdaptationTrigger::Frustration { score } => format!(
            "frustration score {:.2} in the last minute; offering support",
            score
        ),
        AdaptationTrigger::Disengagement { engagement, idle_seconds } => format!(
            "engagement {:.2} with {:.0}s idle; changing presentation to re-engage",
            engagement, idle_seconds
        ),
        AdaptationTrigger::AttentionSpan { span_seconds } => format!(
            "attention span down to {:.0}s; suggesting a short break",
            span_seconds
        ),
        AdaptationTrigger::Rollback { from_level, to_level } => format!(
            "performance dropped past the rollback threshold; reverting level {} to {}",
            from_level, to_level
        ),
        AdaptationTrigger::Maintain => "maintaining current difficulty".to_string(),
    }
}
