//! Ingestion-boundary clamping.
//!
//! Out-of-range telemetry is corrected here so detectors never see invalid
//! values and never need to propagate errors for bad input.

use crate::types::{
    clamp_level, clamp_unit, InteractionState, PerformancePoint, RealTimeContext,
};

/// Returns a corrected copy of a performance point. Negative durations become
/// zero, attempts are at least 1, levels land in [1, 10], unit fields in [0, 1].
pub fn sanitize_point(point: &PerformancePoint) -> PerformancePoint {
    let mut p = point.clone();
    p.difficulty_level = clamp_level(p.difficulty_level);
    p.attempts = p.attempts.max(1);
    p.time_spent_seconds = sanitize_non_negative(p.time_spent_seconds);
    p.score = p.score.map(clamp_unit);
    p.context.session_duration_minutes = sanitize_non_negative(p.context.session_duration_minutes);
    p.context.distraction_level = clamp_unit(p.context.distraction_level);
    p
}

pub fn sanitize_context(context: &RealTimeContext) -> RealTimeContext {
    let mut c = context.clone();
    c.current_interaction = sanitize_interaction(&c.current_interaction);
    c
}

fn sanitize_interaction(interaction: &InteractionState) -> InteractionState {
    let mut i = interaction.clone();
    i.time_spent_seconds = sanitize_non_negative(i.time_spent_seconds);
    i.help_requests = i.help_requests.max(0);
    i.attempts = i.attempts.max(0);
    i.engagement_level = clamp_unit(i.engagement_level);
    for indicator in &mut i.frustration_indicators {
        indicator.intensity = clamp_unit(indicator.intensity);
    }
    for pause in &mut i.pause_events {
        pause.duration_ms = pause.duration_ms.max(0);
    }
    i
}

fn sanitize_non_negative(value: f64) -> f64 {
    if value.is_nan() || value.is_infinite() {
        return 0.0;
    }
    value.max(0.0)
}
