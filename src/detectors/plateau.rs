use serde::{Deserialize, Serialize};

use crate::config::PlateauConfig;
use crate::types::PerformancePoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateauSignal {
    pub detected: bool,
    /// 1 − variance of recent success outcomes; high when performance is flat.
    pub score: f64,
    pub confidence: f64,
}

impl PlateauSignal {
    /// Insufficient-data result: never blocks the cycle, carries no confidence.
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            score: 0.0,
            confidence: 0.0,
        }
    }
}

/// Distinguishes "stable but not improving" from ordinary consistency: a
/// plateau needs flat outcomes over a minimum observation window AND a
/// near-zero improvement rate.
pub struct PlateauDetector {
    config: PlateauConfig,
}

impl PlateauDetector {
    pub fn new(config: PlateauConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, window: &[PerformancePoint], improvement_rate: f64) -> PlateauSignal {
        if window.len() < self.config.min_points {
            return PlateauSignal::not_detected();
        }

        let span_minutes = self.span_minutes(window);
        if span_minutes < self.config.min_span_minutes {
            return PlateauSignal::not_detected();
        }

        let recent = &window[window.len().saturating_sub(self.config.variance_window)..];
        let variance = Self::success_variance(recent);
        let score = (1.0 - variance).clamp(0.0, 1.0);

        let detected = score > self.config.score_threshold
            && improvement_rate < self.config.max_improvement_rate;

        PlateauSignal {
            detected,
            score,
            confidence: if detected { score } else { score * 0.5 },
        }
    }

    fn span_minutes(&self, window: &[PerformancePoint]) -> f64 {
        let first = window.first().map(|p| p.timestamp).unwrap_or(0);
        let last = window.last().map(|p| p.timestamp).unwrap_or(0);
        (last - first).max(0) as f64 / 60_000.0
    }

    fn success_variance(points: &[PerformancePoint]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let len = points.len() as f64;
        let mean = points.iter().filter(|p| p.success).count() as f64 / len;
        points
            .iter()
            .map(|p| {
                let v = if p.success { 1.0 } else { 0.0 };
                (v - mean).powi(2)
            })
            .sum::<f64>()
            / len
    }
}

impl Default for PlateauDetector {
    fn default() -> Self {
        Self::new(PlateauConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(count: usize, span_minutes: i64, success: impl Fn(usize) -> bool) -> Vec<PerformancePoint> {
        let step = if count > 1 {
            span_minutes * 60_000 / (count as i64 - 1)
        } else {
            0
        };
        (0..count)
            .map(|i| PerformancePoint {
                timestamp: 1_700_000_000_000 + i as i64 * step,
                success: success(i),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_too_few_points_not_detected() {
        let detector = PlateauDetector::default();
        let signal = detector.detect(&window(5, 60, |_| true), 0.0);
        assert!(!signal.detected);
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn test_short_span_not_detected() {
        let detector = PlateauDetector::default();
        let signal = detector.detect(&window(10, 20, |_| true), 0.0);
        assert!(!signal.detected);
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn test_flat_performance_over_long_span_detected() {
        let detector = PlateauDetector::default();
        let signal = detector.detect(&window(10, 40, |_| true), 0.01);
        assert!(signal.detected);
        assert!((signal.score - 1.0).abs() < 1e-10);
        assert!(signal.confidence > 0.8);
    }

    #[test]
    fn test_improving_user_is_not_plateaued() {
        let detector = PlateauDetector::default();
        let signal = detector.detect(&window(10, 40, |_| true), 0.05);
        assert!(!signal.detected);
        assert!(signal.score > 0.8);
    }

    #[test]
    fn test_noisy_outcomes_not_a_plateau() {
        let detector = PlateauDetector::default();
        let signal = detector.detect(&window(10, 40, |i| i % 2 == 0), 0.0);
        // Bernoulli(0.5) variance 0.25 -> score 0.75, below the 0.8 gate
        assert!(!signal.detected);
    }

    #[test]
    fn test_score_always_in_unit_range() {
        let detector = PlateauDetector::default();
        for modulo in 1..5 {
            let signal = detector.detect(&window(12, 45, |i| i % modulo == 0), 0.0);
            assert!(signal.score >= 0.0 && signal.score <= 1.0);
            assert!(signal.confidence >= 0.0 && signal.confidence <= 1.0);
        }
    }
}
