use serde::{Deserialize, Serialize};

/// Clamp a difficulty level into the valid [1, 10] band.
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}

/// Clamp a score/confidence value into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub const MIN_LEVEL: i32 = 1;
pub const MAX_LEVEL: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    #[default]
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "morning" => Self::Morning,
            "evening" => Self::Evening,
            "night" => Self::Night,
            _ => Self::Afternoon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkQuality {
    Fast,
    #[default]
    Medium,
    Slow,
}

/// Ambient conditions recorded with a performance point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointContext {
    pub time_of_day: TimeOfDay,
    pub session_duration_minutes: f64,
    pub device_type: DeviceType,
    pub distraction_level: f64,
}

impl Default for PointContext {
    fn default() -> Self {
        Self {
            time_of_day: TimeOfDay::Afternoon,
            session_duration_minutes: 0.0,
            device_type: DeviceType::Desktop,
            distraction_level: 0.0,
        }
    }
}

/// A single normalized interaction outcome from the telemetry collector.
/// Immutable once recorded; consumed in read-only windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub timestamp: i64,
    pub content_id: String,
    pub difficulty_level: i32,
    pub success: bool,
    pub attempts: i32,
    pub time_spent_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub context: PointContext,
}

impl Default for PerformancePoint {
    fn default() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            content_id: String::new(),
            difficulty_level: 5,
            success: true,
            attempts: 1,
            time_spent_seconds: 0.0,
            score: None,
            context: PointContext::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTrigger {
    Performance,
    Time,
    Plateau,
    Manual,
    AiRecommendation,
}

impl AdjustmentTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Time => "time",
            Self::Plateau => "plateau",
            Self::Manual => "manual",
            Self::AiRecommendation => "ai_recommendation",
        }
    }
}

/// One recorded difficulty change, applied or proposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdjustment {
    pub timestamp: i64,
    pub from_level: i32,
    pub to_level: i32,
    pub reason: String,
    pub trigger: AdjustmentTrigger,
    pub confidence: f64,
    pub applied: bool,
}

/// Per-(user, subject) difficulty and performance state.
/// Created lazily with documented defaults; mutated only by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub user_id: String,
    pub subject: String,
    pub current_level: i32,
    pub optimal_level: i32,
    pub confidence: f64,
    pub success_rate: f64,
    pub average_attempts: f64,
    pub time_to_complete: f64,
    pub help_requests: i32,
    pub improvement_rate: f64,
    pub plateau_detected: bool,
    pub last_adjustment: i64,
    pub session_quality: f64,
    pub fatigue_level: f64,
    pub motivation_level: f64,
    pub adjustment_history: Vec<DifficultyAdjustment>,
    pub performance_history: Vec<PerformancePoint>,
}

impl DifficultyProfile {
    pub const DEFAULT_LEVEL: i32 = 5;
    pub const DEFAULT_CONFIDENCE: f64 = 0.3;

    pub fn new(user_id: &str, subject: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            current_level: Self::DEFAULT_LEVEL,
            optimal_level: Self::DEFAULT_LEVEL,
            confidence: Self::DEFAULT_CONFIDENCE,
            success_rate: 0.0,
            average_attempts: 0.0,
            time_to_complete: 0.0,
            help_requests: 0,
            improvement_rate: 0.0,
            plateau_detected: false,
            last_adjustment: 0,
            session_quality: 0.5,
            fatigue_level: 0.0,
            motivation_level: 0.7,
            adjustment_history: Vec::new(),
            performance_history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrustrationKind {
    RapidClicking,
    BackNavigation,
    LongPause,
    HelpSeeking,
    TabSwitching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrustrationIndicator {
    pub kind: FrustrationKind,
    pub intensity: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseEvent {
    pub started_at: i64,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPattern {
    #[default]
    Steady,
    Skimming,
    Erratic,
    Idle,
}

/// Current in-session interaction state. Every field is required; test doubles
/// must supply deterministic values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub time_spent_seconds: f64,
    pub scroll_pattern: ScrollPattern,
    pub click_events: Vec<ClickEvent>,
    pub pause_events: Vec<PauseEvent>,
    pub help_requests: i32,
    pub attempts: i32,
    pub frustration_indicators: Vec<FrustrationIndicator>,
    pub engagement_level: f64,
    pub last_activity_ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalFactors {
    pub time_of_day: TimeOfDay,
    pub device_type: DeviceType,
    pub network_quality: NetworkQuality,
}

/// Ephemeral per-cycle context; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeContext {
    pub session_id: String,
    pub content_id: String,
    pub current_interaction: InteractionState,
    pub environmental_factors: EnvironmentalFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Difficulty,
    Pacing,
    Hints,
    Examples,
    Encouragement,
    ContentFormat,
    BreakSuggestion,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Difficulty => "difficulty",
            Self::Pacing => "pacing",
            Self::Hints => "hints",
            Self::Examples => "examples",
            Self::Encouragement => "encouragement",
            Self::ContentFormat => "content_format",
            Self::BreakSuggestion => "break_suggestion",
        }
    }

    /// Fixed execution priority: higher sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::BreakSuggestion => 10,
            Self::Difficulty => 9,
            Self::Hints => 8,
            Self::Encouragement => 7,
            Self::Pacing => 6,
            Self::Examples => 5,
            Self::ContentFormat => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTiming {
    Immediate,
    NextInteraction,
    NextContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tolerable performance drop before an adaptation is reverted.
    /// Higher risk means a tighter tolerance.
    pub fn rollback_threshold(&self) -> f64 {
        match self {
            Self::High => 0.2,
            Self::Medium => 0.3,
            Self::Low => 0.4,
        }
    }
}

/// Structured cause of an adaptation. Reasoning prose is rendered separately
/// so tests can assert on the variant, not on text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdaptationTrigger {
    FatigueOverride { fatigue: f64 },
    Plateau { score: f64 },
    FlowCorrection { skill_estimate: f64, gap: f64 },
    Mastery { success_rate: f64 },
    Struggle { success_rate: f64 },
    Frustration { score: f64 },
    Disengagement { engagement: f64, idle_seconds: f64 },
    AttentionSpan { span_seconds: f64 },
    Rollback { from_level: i32, to_level: i32 },
    Maintain,
}

impl AdaptationTrigger {
    pub fn adjustment_trigger(&self) -> AdjustmentTrigger {
        match self {
            Self::Plateau { .. } => AdjustmentTrigger::Plateau,
            Self::FatigueOverride { .. } | Self::AttentionSpan { .. } => AdjustmentTrigger::Time,
            Self::Rollback { .. } => AdjustmentTrigger::Manual,
            _ => AdjustmentTrigger::Performance,
        }
    }
}

/// A bounded, explainable adaptation candidate produced by the decision engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationAction {
    pub action_type: ActionType,
    pub intensity: f64,
    pub trigger: AdaptationTrigger,
    pub confidence: f64,
    pub urgency: Urgency,
    pub timing: ActionTiming,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    pub expected_duration_ms: i64,
    pub success_criteria: Vec<String>,
    pub risk: RiskLevel,
    pub rollback_threshold: f64,
}

/// Presentation-neutral descriptor of a visual cue; rendering is the host's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualFeedback {
    pub kind: String,
    pub content: String,
    pub duration_ms: i64,
    pub style: String,
}

/// Outbound request to the content-delivery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub content_id: String,
    pub target_difficulty: i32,
}

/// Result of executing one action. Data only, never imperative UI calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationResult {
    pub applied: bool,
    pub action: AdaptationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapted_content: Option<ContentRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_feedback: Option<VisualFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Append-only audit entry for an applied adaptation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationRecord {
    pub timestamp: i64,
    pub session_id: String,
    pub action_type: ActionType,
    pub trigger: AdaptationTrigger,
    pub previous_level: i32,
    pub new_level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<f64>,
    pub duration_ms: i64,
}

/// Time-based obligation opened after a difficulty change: observe performance
/// until `expires_at`, revert if it drops more than `rollback_threshold`
/// below the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringWindow {
    pub opened_at: i64,
    pub expires_at: i64,
    pub baseline_success_rate: f64,
    pub rollback_threshold: f64,
    pub previous_level: i32,
    pub session_id: String,
    pub record_index: usize,
}

/// Serializable view of a profile and its audit trail for the host's
/// persistence layer. The engine performs no I/O itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub profile: DifficultyProfile,
    pub records: Vec<AdaptationRecord>,
    pub taken_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_level_bounds() {
        assert_eq!(clamp_level(0), 1);
        assert_eq!(clamp_level(-3), 1);
        assert_eq!(clamp_level(11), 10);
        assert_eq!(clamp_level(7), 7);
    }

    #[test]
    fn test_clamp_unit_handles_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
    }

    #[test]
    fn test_profile_defaults() {
        let profile = DifficultyProfile::new("u1", "math");
        assert_eq!(profile.current_level, 5);
        assert!((profile.confidence - 0.3).abs() < f64::EPSILON);
        assert!(profile.adjustment_history.is_empty());
    }

    #[test]
    fn test_action_priority_ordering() {
        assert!(ActionType::BreakSuggestion.priority() > ActionType::Difficulty.priority());
        assert_eq!(ActionType::ContentFormat.priority(), 4);
    }

    #[test]
    fn test_rollback_threshold_scales_inversely_with_risk() {
        assert!(RiskLevel::High.rollback_threshold() < RiskLevel::Medium.rollback_threshold());
        assert!(RiskLevel::Medium.rollback_threshold() < RiskLevel::Low.rollback_threshold());
    }

    #[test]
    fn test_trigger_maps_to_adjustment_trigger() {
        let t = AdaptationTrigger::Rollback {
            from_level: 6,
            to_level: 5,
        };
        assert_eq!(t.adjustment_trigger(), AdjustmentTrigger::Manual);
        let t = AdaptationTrigger::Plateau { score: 0.9 };
        assert_eq!(t.adjustment_trigger(), AdjustmentTrigger::Plateau);
    }
}
