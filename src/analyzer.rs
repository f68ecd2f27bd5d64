use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::types::{clamp_unit, PerformancePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub success_rate: f64,
    pub average_attempts: f64,
    pub average_time_seconds: f64,
    pub trend: Trend,
    pub consistency: f64,
    /// Recent-minus-early success-rate delta; feeds the plateau detector as
    /// the profile's improvement rate.
    pub improvement_rate: f64,
    pub sample_count: usize,
}

pub struct PerformanceAnalyzer {
    config: AnalyzerConfig,
}

impl PerformanceAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Aggregates a read-only window of points, newest last. An empty window
    /// yields the documented neutral defaults rather than an error.
    pub fn analyze(&self, window: &[PerformancePoint]) -> PerformanceAnalysis {
        if window.is_empty() {
            return PerformanceAnalysis {
                success_rate: self.config.default_success_rate,
                average_attempts: self.config.default_attempts,
                average_time_seconds: self.config.default_time_seconds,
                trend: Trend::Stable,
                consistency: self.config.default_consistency,
                improvement_rate: 0.0,
                sample_count: 0,
            };
        }

        let len = window.len() as f64;
        let successes = window.iter().filter(|p| p.success).count() as f64;
        let success_rate = successes / len;
        let average_attempts = window.iter().map(|p| p.attempts as f64).sum::<f64>() / len;
        let average_time_seconds = window.iter().map(|p| p.time_spent_seconds).sum::<f64>() / len;

        let (trend, improvement_rate) = self.compute_trend(window);
        let consistency = clamp_unit(1.0 - self.success_variance(window));

        PerformanceAnalysis {
            success_rate,
            average_attempts,
            average_time_seconds,
            trend,
            consistency,
            improvement_rate,
            sample_count: window.len(),
        }
    }

    fn compute_trend(&self, window: &[PerformancePoint]) -> (Trend, f64) {
        let span = self.config.trend_span;
        if window.len() < span + 1 {
            return (Trend::Stable, 0.0);
        }

        let early_rate = Self::success_rate_of(&window[..span]);
        let recent_rate = Self::success_rate_of(&window[window.len() - span..]);
        let delta = recent_rate - early_rate;

        let trend = if delta > self.config.trend_threshold {
            Trend::Improving
        } else if delta < -self.config.trend_threshold {
            Trend::Declining
        } else {
            Trend::Stable
        };
        (trend, delta)
    }

    fn success_variance(&self, window: &[PerformancePoint]) -> f64 {
        let len = window.len() as f64;
        let mean = window.iter().filter(|p| p.success).count() as f64 / len;
        window
            .iter()
            .map(|p| {
                let v = if p.success { 1.0 } else { 0.0 };
                (v - mean).powi(2)
            })
            .sum::<f64>()
            / len
    }

    fn success_rate_of(points: &[PerformancePoint]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        points.iter().filter(|p| p.success).count() as f64 / points.len() as f64
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
