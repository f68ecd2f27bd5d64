use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Window length handed to the analyzer (newest points last).
    pub window_size: usize,
    /// Points compared at each end of the window for the trend estimate.
    pub trend_span: usize,
    pub trend_threshold: f64,
    /// Neutral defaults returned on an empty window to keep cold-start
    /// recommendations conservative.
    pub default_success_rate: f64,
    pub default_attempts: f64,
    pub default_time_seconds: f64,
    pub default_consistency: f64,
    /// How much profile confidence can grow above its creation default once
    /// the analysis window is full of consistent evidence.
    pub confidence_gain: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            trend_span: 5,
            trend_threshold: 0.10,
            default_success_rate: 0.7,
            default_attempts: 1.5,
            default_time_seconds: 300.0,
            default_consistency: 0.7,
            confidence_gain: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Skill estimate sensitivity to success-rate deviation from target.
    pub skill_gain: f64,
    pub target_success_rate: f64,
    pub trend_adjustment: f64,
    /// Gap (in levels) beyond which flow is fully broken.
    pub gap_tolerance: f64,
    pub sweet_band_low: f64,
    pub sweet_band_high: f64,
    pub off_band_factor: f64,
    pub help_penalty_divisor: f64,
    pub flow_threshold: f64,
    /// Gap that justifies a corrective difficulty action.
    pub correction_gap: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            skill_gain: 3.0,
            target_success_rate: 0.7,
            trend_adjustment: 0.5,
            gap_tolerance: 3.0,
            sweet_band_low: 0.6,
            sweet_band_high: 0.9,
            off_band_factor: 0.6,
            help_penalty_divisor: 2.0,
            flow_threshold: 0.7,
            correction_gap: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateauConfig {
    pub min_points: usize,
    pub min_span_minutes: f64,
    /// Most recent points whose success variance is examined.
    pub variance_window: usize,
    pub score_threshold: f64,
    pub max_improvement_rate: f64,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            min_span_minutes: 30.0,
            variance_window: 10,
            score_threshold: 0.8,
            max_improvement_rate: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatigueConfig {
    /// Hours of continuous session time that alone saturate fatigue at 0.5.
    pub session_weight: f64,
    pub error_weight: f64,
    pub error_cap: f64,
    pub evening_adjustment: f64,
    pub morning_adjustment: f64,
    pub motivation_floor: f64,
    pub reduce_threshold: f64,
    /// Fatigue at which a break is suggested on top of the difficulty drop.
    pub break_threshold: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            session_weight: 0.5,
            error_weight: 0.1,
            error_cap: 0.3,
            evening_adjustment: 0.1,
            morning_adjustment: -0.1,
            motivation_floor: 0.3,
            reduce_threshold: 0.7,
            break_threshold: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrustrationConfig {
    /// Only indicators within this trailing window count.
    pub indicator_window_seconds: f64,
    pub immediate_support_threshold: f64,
    pub encouragement_threshold: f64,
    pub low_engagement_threshold: f64,
    pub idle_threshold_seconds: f64,
    /// Mean pause gap below this counts as a short attention span.
    pub low_attention_span_seconds: f64,
    /// Session minutes after which a persistently short span suggests a break.
    pub break_after_minutes: f64,
}

impl Default for FrustrationConfig {
    fn default() -> Self {
        Self {
            indicator_window_seconds: 60.0,
            immediate_support_threshold: 0.7,
            encouragement_threshold: 0.4,
            low_engagement_threshold: 0.4,
            idle_threshold_seconds: 30.0,
            low_attention_span_seconds: 45.0,
            break_after_minutes: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Minimum confidence before an action is executed rather than logged.
    pub confidence_threshold: f64,
    pub fatigue_confidence: f64,
    pub mastery_confidence: f64,
    pub struggle_confidence: f64,
    /// Cap on flow-correction confidence: min(cap, flow_score + boost).
    pub flow_confidence_cap: f64,
    pub flow_confidence_boost: f64,
    pub mastery_success_rate: f64,
    pub struggle_success_rate: f64,
    pub encouragement_confidence: f64,
    pub pacing_confidence: f64,
    pub break_confidence: f64,
    pub reengagement_confidence: f64,
    pub examples_confidence: f64,
    /// Risk classification: adjustments of this magnitude or more are high risk.
    pub high_risk_magnitude: i32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            fatigue_confidence: 0.8,
            mastery_confidence: 0.7,
            struggle_confidence: 0.8,
            flow_confidence_cap: 0.8,
            flow_confidence_boost: 0.3,
            mastery_success_rate: 0.9,
            struggle_success_rate: 0.5,
            encouragement_confidence: 0.7,
            pacing_confidence: 0.75,
            break_confidence: 0.8,
            reengagement_confidence: 0.6,
            examples_confidence: 0.65,
            high_risk_magnitude: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Default monitoring window after a difficulty change.
    pub monitoring_duration_ms: i64,
    pub feedback_duration_ms: i64,
    /// Cap on retained performance history per profile.
    pub history_cap: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            monitoring_duration_ms: 10 * 60 * 1000,
            feedback_duration_ms: 4000,
            history_cap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub analyzer: AnalyzerConfig,
    pub flow: FlowConfig,
    pub plateau: PlateauConfig,
    pub fatigue: FatigueConfig,
    pub frustration: FrustrationConfig,
    pub decision: DecisionConfig,
    pub executor: ExecutorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            flow: FlowConfig::default(),
            plateau: PlateauConfig::default(),
            fatigue: FatigueConfig::default(),
            frustration: FrustrationConfig::default(),
            decision: DecisionConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ADAPT_CONFIDENCE_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.decision.confidence_threshold = v;
            }
        }
        if let Ok(val) = std::env::var("ADAPT_MONITORING_DURATION_MS") {
            if let Ok(v) = val.parse() {
                config.executor.monitoring_duration_ms = v;
            }
        }
        if let Ok(val) = std::env::var("ADAPT_ANALYZER_WINDOW") {
            if let Ok(v) = val.parse() {
                config.analyzer.window_size = v;
            }
        }

        config
    }
}
