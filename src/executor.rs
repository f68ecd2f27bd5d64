use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::error::EngineError;
use crate::explain;
use crate::types::{
    ActionTiming, ActionType, AdaptationAction, AdaptationRecord, AdaptationResult,
    AdaptationTrigger, ContentRequest, DifficultyAdjustment, DifficultyProfile, MonitoringWindow,
    RealTimeContext, RiskLevel, Urgency, VisualFeedback, MAX_LEVEL, MIN_LEVEL,
};

/// Outcome of applying one action. The record is handed back so the caller
/// can append it to the audit log and wire the resulting index into a
/// monitoring window.
#[derive(Debug, Clone)]
pub struct Execution {
    pub result: AdaptationResult,
    pub record: AdaptationRecord,
}

/// Verdict of a cooperative monitoring check.
#[derive(Debug, Clone)]
pub enum MonitoringVerdict {
    StillOpen,
    /// Window expired without a violation; the original record's
    /// effectiveness should be filled with this value.
    Resolved { effectiveness: f64 },
    /// Performance dropped past the tolerance; the profile has been reverted
    /// and the rollback is reported as its own applied result.
    RolledBack {
        result: AdaptationResult,
        rollback_record: AdaptationRecord,
    },
}

/// Applies decided actions to the profile. All-or-nothing: validation happens
/// before any mutation, so a failed execution leaves the profile untouched.
pub struct AdaptationExecutor {
    config: ExecutorConfig,
}

impl AdaptationExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn execute(
        &self,
        action: &AdaptationAction,
        profile: &mut DifficultyProfile,
        context: &RealTimeContext,
        now: i64,
    ) -> Result<Execution, EngineError> {
        match action.action_type {
            ActionType::Difficulty => self.execute_difficulty(action, profile, context, now),
            _ => Ok(self.execute_support(action, profile, context, now)),
        }
    }

    /// Wraps an execution failure into the safe "nothing happened" result.
    pub fn unavailable(action: &AdaptationAction, error: &EngineError) -> AdaptationResult {
        warn!(action = action.action_type.as_str(), error = %error, "adaptation failed to apply");
        AdaptationResult {
            applied: false,
            action: action.clone(),
            adapted_content: None,
            visual_feedback: None,
            system_message: Some("adaptation unavailable".to_string()),
        }
    }

    fn execute_difficulty(
        &self,
        action: &AdaptationAction,
        profile: &mut DifficultyProfile,
        context: &RealTimeContext,
        now: i64,
    ) -> Result<Execution, EngineError> {
        let target = action
            .parameters
            .get("targetLevel")
            .and_then(|v| v.as_i64())
            .ok_or(EngineError::MissingParameter {
                action_type: ActionType::Difficulty,
                parameter: "targetLevel",
            })?;
        if target < MIN_LEVEL as i64 || target > MAX_LEVEL as i64 {
            return Err(EngineError::LevelOutOfRange { level: target });
        }
        let target = target as i32;
        let previous = profile.current_level;

        profile.current_level = target;
        profile.last_adjustment = now;
        profile.adjustment_history.push(DifficultyAdjustment {
            timestamp: now,
            from_level: previous,
            to_level: target,
            reason: explain::describe(&action.trigger),
            trigger: action.trigger.adjustment_trigger(),
            confidence: action.confidence,
            applied: true,
        });

        debug!(
            user = profile.user_id.as_str(),
            from = previous,
            to = target,
            "difficulty adjusted"
        );

        let record = self.record_for(action, context, now, previous, target);
        let result = AdaptationResult {
            applied: true,
            action: action.clone(),
            adapted_content: Some(ContentRequest {
                content_id: context.content_id.clone(),
                target_difficulty: target,
            }),
            visual_feedback: None,
            system_message: Some(explain::describe(&action.trigger)),
        };
        Ok(Execution { result, record })
    }

    fn execute_support(
        &self,
        action: &AdaptationAction,
        profile: &DifficultyProfile,
        context: &RealTimeContext,
        now: i64,
    ) -> Execution {
        let message = explain::describe(&action.trigger);
        let (adapted_content, visual_feedback) = match action.action_type {
            ActionType::Hints => (None, Some(self.feedback("hint_prompt", &message, "supportive"))),
            ActionType::Encouragement => {
                (None, Some(self.feedback("encouragement", &message, "positive")))
            }
            ActionType::BreakSuggestion => {
                (None, Some(self.feedback("break_suggestion", &message, "calm")))
            }
            ActionType::Pacing => (None, Some(self.feedback("pacing", &message, "neutral"))),
            ActionType::Examples | ActionType::ContentFormat => (
                Some(ContentRequest {
                    content_id: context.content_id.clone(),
                    target_difficulty: profile.current_level,
                }),
                None,
            ),
            ActionType::Difficulty => (None, None),
        };

        let record = self.record_for(
            action,
            context,
            now,
            profile.current_level,
            profile.current_level,
        );
        let result = AdaptationResult {
            applied: true,
            action: action.clone(),
            adapted_content,
            visual_feedback,
            system_message: Some(message),
        };
        Execution { result, record }
    }

    fn feedback(&self, kind: &str, content: &str, style: &str) -> VisualFeedback {
        VisualFeedback {
            kind: kind.to_string(),
            content: content.to_string(),
            duration_ms: self.config.feedback_duration_ms,
            style: style.to_string(),
        }
    }

    fn record_for(
        &self,
        action: &AdaptationAction,
        context: &RealTimeContext,
        now: i64,
        previous_level: i32,
        new_level: i32,
    ) -> AdaptationRecord {
        AdaptationRecord {
            timestamp: now,
            session_id: context.session_id.clone(),
            action_type: action.action_type,
            trigger: action.trigger.clone(),
            previous_level,
            new_level,
            effectiveness: None,
            duration_ms: action.expected_duration_ms,
        }
    }

    /// Opens the observation obligation that follows a difficulty change.
    pub fn open_window(
        &self,
        action: &AdaptationAction,
        baseline_success_rate: f64,
        previous_level: i32,
        session_id: &str,
        record_index: usize,
        now: i64,
    ) -> MonitoringWindow {
        MonitoringWindow {
            opened_at: now,
            expires_at: now + self.config.monitoring_duration_ms,
            baseline_success_rate,
            rollback_threshold: action.rollback_threshold,
            previous_level,
            session_id: session_id.to_string(),
            record_index,
        }
    }

    /// Checked cooperatively at the start of each cycle rather than by a
    /// background task. A violation reverts the level and records the
    /// rollback as a fresh adjustment; it never rewrites history.
    pub fn check_monitoring(
        &self,
        window: &MonitoringWindow,
        profile: &mut DifficultyProfile,
        current_success_rate: f64,
        context: &RealTimeContext,
        now: i64,
    ) -> MonitoringVerdict {
        let drop = window.baseline_success_rate - current_success_rate;

        // An expired window resolves no matter what the current numbers say;
        // a drop observed after expiry belongs to whatever happened since,
        // not to the adaptation under observation.
        if now >= window.expires_at {
            let effectiveness = if window.rollback_threshold > 0.0 {
                (1.0 - drop.max(0.0) / window.rollback_threshold).clamp(0.0, 1.0)
            } else {
                1.0
            };
            return MonitoringVerdict::Resolved { effectiveness };
        }

        if drop > window.rollback_threshold {
            let from = profile.current_level;
            let to = window.previous_level;
            let trigger = AdaptationTrigger::Rollback {
                from_level: from,
                to_level: to,
            };
            let reason = explain::describe(&trigger);

            profile.current_level = to;
            profile.last_adjustment = now;
            profile.adjustment_history.push(DifficultyAdjustment {
                timestamp: now,
                from_level: from,
                to_level: to,
                reason: reason.clone(),
                trigger: trigger.adjustment_trigger(),
                confidence: 1.0,
                applied: true,
            });

            warn!(
                user = profile.user_id.as_str(),
                baseline = window.baseline_success_rate,
                current = current_success_rate,
                "monitoring threshold violated; difficulty reverted"
            );

            let action = AdaptationAction {
                action_type: ActionType::Difficulty,
                intensity: 1.0,
                trigger: trigger.clone(),
                confidence: 1.0,
                urgency: Urgency::High,
                timing: ActionTiming::Immediate,
                parameters: {
                    let mut m = serde_json::Map::new();
                    m.insert("fromLevel".into(), from.into());
                    m.insert("targetLevel".into(), to.into());
                    m
                },
                expected_duration_ms: 0,
                success_criteria: Vec::new(),
                risk: RiskLevel::Low,
                rollback_threshold: RiskLevel::Low.rollback_threshold(),
            };
            let rollback_record = AdaptationRecord {
                timestamp: now,
                session_id: context.session_id.clone(),
                action_type: ActionType::Difficulty,
                trigger,
                previous_level: from,
                new_level: to,
                effectiveness: None,
                duration_ms: 0,
            };
            let result = AdaptationResult {
                applied: true,
                action,
                adapted_content: Some(ContentRequest {
                    content_id: context.content_id.clone(),
                    target_difficulty: to,
                }),
                visual_feedback: None,
                system_message: Some(reason),
            };
            return MonitoringVerdict::RolledBack {
                result,
                rollback_record,
            };
        }

        MonitoringVerdict::StillOpen
    }
}

impl Default for AdaptationExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActionTiming, EnvironmentalFactors, InteractionState, RiskLevel, ScrollPattern, Urgency,
    };

    const NOW: i64 = 1_700_000_000_000;

    fn context() -> RealTimeContext {
        RealTimeContext {
            session_id: "s1".to_string(),
            content_id: "lesson-7".to_string(),
            current_interaction: InteractionState {
                time_spent_seconds: 120.0,
                scroll_pattern: ScrollPattern::Steady,
                click_events: vec![],
                pause_events: vec![],
                help_requests: 0,
                attempts: 1,
                frustration_indicators: vec![],
                engagement_level: 0.8,
                last_activity_ts: NOW,
            },
            environmental_factors: EnvironmentalFactors::default(),
        }
    }

    fn difficulty_action(from: i32, to: i32) -> AdaptationAction {
        let mut parameters = serde_json::Map::new();
        parameters.insert("fromLevel".into(), from.into());
        parameters.insert("targetLevel".into(), to.into());
        AdaptationAction {
            action_type: ActionType::Difficulty,
            intensity: 0.5,
            trigger: AdaptationTrigger::Mastery { success_rate: 0.95 },
            confidence: 0.7,
            urgency: Urgency::Low,
            timing: ActionTiming::Immediate,
            parameters,
            expected_duration_ms: 0,
            success_criteria: vec![],
            risk: RiskLevel::Medium,
            rollback_threshold: 0.3,
        }
    }

    #[test]
    fn test_difficulty_execution_mutates_profile_and_records() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        let execution = executor
            .execute(&difficulty_action(5, 6), &mut profile, &context(), NOW)
            .unwrap();

        assert_eq!(profile.current_level, 6);
        assert_eq!(profile.adjustment_history.len(), 1);
        assert_eq!(profile.last_adjustment, NOW);
        assert!(execution.result.applied);
        assert_eq!(execution.record.previous_level, 5);
        assert_eq!(execution.record.new_level, 6);
        assert_eq!(
            execution.result.adapted_content.unwrap().target_difficulty,
            6
        );
    }

    #[test]
    fn test_missing_parameter_leaves_profile_untouched() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        let mut action = difficulty_action(5, 6);
        action.parameters.remove("targetLevel");

        let err = executor
            .execute(&action, &mut profile, &context(), NOW)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingParameter { .. }));
        assert_eq!(profile.current_level, 5);
        assert!(profile.adjustment_history.is_empty());

        let result = AdaptationExecutor::unavailable(&action, &err);
        assert!(!result.applied);
        assert_eq!(result.system_message.as_deref(), Some("adaptation unavailable"));
    }

    #[test]
    fn test_out_of_range_target_rejected() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        let mut action = difficulty_action(5, 6);
        action.parameters["targetLevel"] = 12.into();

        let err = executor
            .execute(&action, &mut profile, &context(), NOW)
            .unwrap_err();
        assert!(matches!(err, EngineError::LevelOutOfRange { level: 12 }));
        assert_eq!(profile.current_level, 5);
    }

    #[test]
    fn test_support_action_is_data_only() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        let action = AdaptationAction {
            action_type: ActionType::Encouragement,
            intensity: 0.5,
            trigger: AdaptationTrigger::Frustration { score: 0.5 },
            confidence: 0.7,
            urgency: Urgency::Medium,
            timing: ActionTiming::Immediate,
            parameters: serde_json::Map::new(),
            expected_duration_ms: 0,
            success_criteria: vec![],
            risk: RiskLevel::Low,
            rollback_threshold: 0.4,
        };

        let execution = executor
            .execute(&action, &mut profile, &context(), NOW)
            .unwrap();
        assert!(execution.result.applied);
        assert_eq!(profile.current_level, 5);
        assert!(profile.adjustment_history.is_empty());
        let feedback = execution.result.visual_feedback.unwrap();
        assert_eq!(feedback.kind, "encouragement");
        assert_eq!(feedback.duration_ms, 4000);
    }

    #[test]
    fn test_monitoring_rollback_reverts_level() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        profile.current_level = 6;
        let window = executor.open_window(&difficulty_action(5, 6), 0.8, 5, "s1", 0, NOW);

        // Drop of 0.35 exceeds the 0.3 tolerance.
        let verdict =
            executor.check_monitoring(&window, &mut profile, 0.45, &context(), NOW + 60_000);
        match verdict {
            MonitoringVerdict::RolledBack {
                result,
                rollback_record,
            } => {
                assert_eq!(profile.current_level, 5);
                assert!(result.applied);
                assert_eq!(rollback_record.previous_level, 6);
                assert_eq!(rollback_record.new_level, 5);
                assert!(matches!(
                    rollback_record.trigger,
                    AdaptationTrigger::Rollback { .. }
                ));
                let last = profile.adjustment_history.last().unwrap();
                assert_eq!(last.trigger, crate::types::AdjustmentTrigger::Manual);
            }
            other => panic!("expected rollback, got {other:?}"),
        }
    }

    #[test]
    fn test_monitoring_resolves_after_expiry() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        profile.current_level = 6;
        let window = executor.open_window(&difficulty_action(5, 6), 0.8, 5, "s1", 0, NOW);

        let verdict = executor.check_monitoring(
            &window,
            &mut profile,
            0.82,
            &context(),
            NOW + 11 * 60 * 1000,
        );
        match verdict {
            MonitoringVerdict::Resolved { effectiveness } => {
                assert!((effectiveness - 1.0).abs() < 1e-10);
                assert_eq!(profile.current_level, 6);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_late_drop_after_expiry_does_not_roll_back() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        profile.current_level = 6;
        let window = executor.open_window(&difficulty_action(5, 6), 0.8, 5, "s1", 0, NOW);

        // Collapse observed five minutes after the window closed.
        let verdict = executor.check_monitoring(
            &window,
            &mut profile,
            0.0,
            &context(),
            NOW + 15 * 60 * 1000,
        );
        match verdict {
            MonitoringVerdict::Resolved { effectiveness } => {
                assert_eq!(effectiveness, 0.0);
                assert_eq!(profile.current_level, 6);
                assert!(profile.adjustment_history.is_empty());
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_monitoring_tolerable_drop_stays_open() {
        let executor = AdaptationExecutor::default();
        let mut profile = DifficultyProfile::new("u1", "math");
        let window = executor.open_window(&difficulty_action(5, 6), 0.8, 5, "s1", 0, NOW);

        let verdict =
            executor.check_monitoring(&window, &mut profile, 0.6, &context(), NOW + 60_000);
        assert!(matches!(verdict, MonitoringVerdict::StillOpen));
    }
}
