use serde::{Deserialize, Serialize};

use crate::analyzer::{PerformanceAnalysis, Trend};
use crate::config::FlowConfig;
use crate::types::clamp_unit;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSignal {
    /// Estimated skill on the 1-10 difficulty scale (fractional).
    pub skill_estimate: f64,
    pub difficulty_gap: f64,
    pub flow_score: f64,
    pub in_flow: bool,
}

/// Estimates whether content difficulty currently matches the learner's skill.
pub struct FlowStateDetector {
    config: FlowConfig,
}

impl FlowStateDetector {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    pub fn detect(
        &self,
        current_level: i32,
        analysis: &PerformanceAnalysis,
        help_requests: i32,
    ) -> FlowSignal {
        let trend_adjustment = match analysis.trend {
            Trend::Improving => self.config.trend_adjustment,
            Trend::Declining => -self.config.trend_adjustment,
            Trend::Stable => 0.0,
        };

        let skill_estimate = (current_level as f64
            + self.config.skill_gain * (analysis.success_rate - self.config.target_success_rate)
            + trend_adjustment)
            .clamp(1.0, 10.0);

        let difficulty_gap = (current_level as f64 - skill_estimate).abs();

        let gap_factor = (1.0 - difficulty_gap / self.config.gap_tolerance).max(0.0);
        let band_factor = if analysis.success_rate >= self.config.sweet_band_low
            && analysis.success_rate <= self.config.sweet_band_high
        {
            1.0
        } else {
            self.config.off_band_factor
        };
        let help_factor =
            (1.0 - help_requests as f64 / self.config.help_penalty_divisor).max(0.0);

        let flow_score = clamp_unit(gap_factor * analysis.consistency * band_factor * help_factor);

        FlowSignal {
            skill_estimate,
            difficulty_gap,
            flow_score,
            in_flow: flow_score > self.config.flow_threshold,
        }
    }

    /// Gap beyond which the decision engine should issue a corrective action.
    pub fn correction_gap(&self) -> f64 {
        self.config.correction_gap
    }
}

impl Default for FlowStateDetector {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}
