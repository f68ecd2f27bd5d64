use serde::{Deserialize, Serialize};

use crate::config::FrustrationConfig;
use crate::types::{clamp_unit, InteractionState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrustrationSignal {
    pub score: f64,
    pub indicator_count: usize,
    pub needs_immediate_support: bool,
    pub needs_encouragement: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSignal {
    pub engagement_level: f64,
    pub idle_seconds: f64,
    /// Mean gap between pause events; a proxy for attention span.
    pub attention_span_seconds: f64,
    pub needs_reengagement: bool,
    pub needs_break: bool,
}

/// Reads frustration and engagement out of the raw interaction state for the
/// current cycle. Both signals are pure functions of the context plus "now".
pub struct FrustrationDetector {
    config: FrustrationConfig,
}

impl FrustrationDetector {
    pub fn new(config: FrustrationConfig) -> Self {
        Self { config }
    }

    pub fn detect_frustration(&self, interaction: &InteractionState, now: i64) -> FrustrationSignal {
        let window_ms = (self.config.indicator_window_seconds * 1000.0) as i64;
        let cutoff = now - window_ms;

        let recent: Vec<f64> = interaction
            .frustration_indicators
            .iter()
            .filter(|i| i.timestamp >= cutoff && i.timestamp <= now)
            .map(|i| clamp_unit(i.intensity))
            .collect();

        let score = if recent.is_empty() {
            0.0
        } else {
            clamp_unit(recent.iter().sum::<f64>() / recent.len() as f64)
        };

        FrustrationSignal {
            score,
            indicator_count: recent.len(),
            needs_immediate_support: score > self.config.immediate_support_threshold,
            needs_encouragement: score > self.config.encouragement_threshold,
        }
    }

    pub fn detect_engagement(&self, interaction: &InteractionState, now: i64) -> EngagementSignal {
        let engagement_level = clamp_unit(interaction.engagement_level);
        let idle_seconds = ((now - interaction.last_activity_ts).max(0)) as f64 / 1000.0;
        let attention_span_seconds = self.estimate_attention_span(interaction);

        let needs_reengagement = engagement_level < self.config.low_engagement_threshold
            || idle_seconds > self.config.idle_threshold_seconds;

        let session_minutes = interaction.time_spent_seconds / 60.0;
        let needs_break = attention_span_seconds < self.config.low_attention_span_seconds
            && session_minutes > self.config.break_after_minutes;

        EngagementSignal {
            engagement_level,
            idle_seconds,
            attention_span_seconds,
            needs_reengagement,
            needs_break,
        }
    }

    /// With fewer than two pauses there is no gap evidence, so the whole
    /// session counts as one sustained span.
    fn estimate_attention_span(&self, interaction: &InteractionState) -> f64 {
        let pauses = &interaction.pause_events;
        if pauses.len() < 2 {
            return interaction.time_spent_seconds.max(0.0);
        }

        let mut starts: Vec<i64> = pauses.iter().map(|p| p.started_at).collect();
        starts.sort_unstable();
        let gaps: Vec<f64> = starts
            .windows(2)
            .map(|w| (w[1] - w[0]).max(0) as f64 / 1000.0)
            .collect();
        gaps.iter().sum::<f64>() / gaps.len() as f64
    }
}

impl Default for FrustrationDetector {
    fn default() -> Self {
        Self::new(FrustrationConfig::default())
    }
}
