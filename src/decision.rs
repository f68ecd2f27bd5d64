use serde::{Deserialize, Serialize};

use crate::analyzer::{PerformanceAnalysis, Trend};
use crate::config::DecisionConfig;
use crate::detectors::{EngagementSignal, FatigueSignal, FlowSignal, FrustrationSignal, PlateauSignal};
use crate::explain;
use crate::types::{
    clamp_level, ActionTiming, ActionType, AdaptationAction, AdaptationTrigger, DifficultyProfile,
    RiskLevel, Urgency,
};

/// Output of one decision cycle: a ranked, deduplicated action list split at
/// the confidence/timing gate. Deferred actions are reported for observability
/// and queued by the engine for the next interaction or content boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub immediate: Vec<AdaptationAction>,
    pub deferred: Vec<AdaptationAction>,
    pub primary_trigger: AdaptationTrigger,
    pub reasoning: String,
}

pub struct AdaptationDecisionEngine {
    config: DecisionConfig,
    correction_gap: f64,
}

impl AdaptationDecisionEngine {
    pub fn new(config: DecisionConfig, correction_gap: f64) -> Self {
        Self {
            config,
            correction_gap,
        }
    }

    pub fn decide(
        &self,
        profile: &DifficultyProfile,
        analysis: &PerformanceAnalysis,
        flow: &FlowSignal,
        plateau: &PlateauSignal,
        fatigue: &FatigueSignal,
        frustration: &FrustrationSignal,
        engagement: &EngagementSignal,
    ) -> Decision {
        let mut candidates: Vec<AdaptationAction> = Vec::new();

        let primary_trigger = match self.primary_difficulty_action(profile, analysis, flow, plateau, fatigue) {
            Some(action) => {
                let trigger = action.trigger.clone();
                candidates.push(action);
                trigger
            }
            None => AdaptationTrigger::Maintain,
        };

        self.push_support_actions(&mut candidates, fatigue, frustration, engagement, analysis);

        let mut ranked = Self::rank_and_dedup(candidates);

        let mut immediate = Vec::new();
        let mut deferred = Vec::new();
        for action in ranked.drain(..) {
            if action.confidence >= self.config.confidence_threshold
                && action.timing == ActionTiming::Immediate
            {
                immediate.push(action);
            } else {
                deferred.push(action);
            }
        }

        let reasoning = explain::describe(&primary_trigger);
        Decision {
            immediate,
            deferred,
            primary_trigger,
            reasoning,
        }
    }

    /// First true condition wins. Detectors may still contribute secondary
    /// actions of other types independently.
    fn primary_difficulty_action(
        &self,
        profile: &DifficultyProfile,
        analysis: &PerformanceAnalysis,
        flow: &FlowSignal,
        plateau: &PlateauSignal,
        fatigue: &FatigueSignal,
    ) -> Option<AdaptationAction> {
        let level = profile.current_level;

        if fatigue.reduce_difficulty {
            return Some(self.difficulty_action(
                level,
                level - 1,
                AdaptationTrigger::FatigueOverride {
                    fatigue: fatigue.fatigue,
                },
                self.config.fatigue_confidence,
                Urgency::High,
            ));
        }

        if plateau.detected {
            return Some(self.difficulty_action(
                level,
                level + 1,
                AdaptationTrigger::Plateau {
                    score: plateau.score,
                },
                plateau.score,
                Urgency::Medium,
            ));
        }

        if !flow.in_flow && flow.difficulty_gap > self.correction_gap {
            let target = clamp_level(flow.skill_estimate.round() as i32);
            let confidence = (flow.flow_score + self.config.flow_confidence_boost)
                .min(self.config.flow_confidence_cap);
            // A sub-threshold correction would only be logged; let the
            // performance rules below speak instead.
            if target != level && confidence >= self.config.confidence_threshold {
                return Some(self.difficulty_action(
                    level,
                    target,
                    AdaptationTrigger::FlowCorrection {
                        skill_estimate: flow.skill_estimate,
                        gap: flow.difficulty_gap,
                    },
                    confidence,
                    Urgency::Medium,
                ));
            }
        }

        if analysis.success_rate > self.config.mastery_success_rate
            && analysis.trend == Trend::Improving
        {
            return Some(self.difficulty_action(
                level,
                level + 1,
                AdaptationTrigger::Mastery {
                    success_rate: analysis.success_rate,
                },
                self.config.mastery_confidence,
                Urgency::Low,
            ));
        }

        if analysis.success_rate < self.config.struggle_success_rate
            && analysis.trend == Trend::Declining
        {
            return Some(self.difficulty_action(
                level,
                level - 1,
                AdaptationTrigger::Struggle {
                    success_rate: analysis.success_rate,
                },
                self.config.struggle_confidence,
                Urgency::Medium,
            ));
        }

        None
    }

    fn push_support_actions(
        &self,
        candidates: &mut Vec<AdaptationAction>,
        fatigue: &FatigueSignal,
        frustration: &FrustrationSignal,
        engagement: &EngagementSignal,
        analysis: &PerformanceAnalysis,
    ) {
        if frustration.needs_immediate_support {
            candidates.push(self.support_action(
                ActionType::Hints,
                frustration.score,
                AdaptationTrigger::Frustration {
                    score: frustration.score,
                },
                frustration.score,
                Urgency::High,
                ActionTiming::Immediate,
            ));
        } else if frustration.needs_encouragement {
            candidates.push(self.support_action(
                ActionType::Encouragement,
                frustration.score,
                AdaptationTrigger::Frustration {
                    score: frustration.score,
                },
                self.config.encouragement_confidence,
                Urgency::Medium,
                ActionTiming::Immediate,
            ));
        }

        if fatigue.reduce_difficulty {
            candidates.push(self.support_action(
                ActionType::Pacing,
                fatigue.fatigue,
                AdaptationTrigger::FatigueOverride {
                    fatigue: fatigue.fatigue,
                },
                self.config.pacing_confidence,
                Urgency::Medium,
                ActionTiming::Immediate,
            ));
        }

        if fatigue.suggest_break {
            candidates.push(self.support_action(
                ActionType::BreakSuggestion,
                fatigue.fatigue,
                AdaptationTrigger::FatigueOverride {
                    fatigue: fatigue.fatigue,
                },
                self.config.break_confidence,
                Urgency::High,
                ActionTiming::Immediate,
            ));
        } else if engagement.needs_break {
            candidates.push(self.support_action(
                ActionType::BreakSuggestion,
                1.0 - clamp_span_factor(engagement.attention_span_seconds),
                AdaptationTrigger::AttentionSpan {
                    span_seconds: engagement.attention_span_seconds,
                },
                self.config.break_confidence,
                Urgency::Medium,
                ActionTiming::Immediate,
            ));
        }

        if engagement.needs_reengagement {
            candidates.push(self.support_action(
                ActionType::ContentFormat,
                1.0 - engagement.engagement_level,
                AdaptationTrigger::Disengagement {
                    engagement: engagement.engagement_level,
                    idle_seconds: engagement.idle_seconds,
                },
                self.config.reengagement_confidence,
                Urgency::Medium,
                ActionTiming::NextContent,
            ));
        }

        if analysis.success_rate < self.config.struggle_success_rate
            && analysis.trend == Trend::Declining
        {
            candidates.push(self.support_action(
                ActionType::Examples,
                1.0 - analysis.success_rate,
                AdaptationTrigger::Struggle {
                    success_rate: analysis.success_rate,
                },
                self.config.examples_confidence,
                Urgency::Low,
                ActionTiming::NextInteraction,
            ));
        }
    }

    fn difficulty_action(
        &self,
        from_level: i32,
        target: i32,
        trigger: AdaptationTrigger,
        confidence: f64,
        urgency: Urgency,
    ) -> AdaptationAction {
        let to_level = clamp_level(target);
        let magnitude = (to_level - from_level).abs();
        let risk = self.classify_risk(magnitude, confidence);

        let mut parameters = serde_json::Map::new();
        parameters.insert("fromLevel".into(), from_level.into());
        parameters.insert("targetLevel".into(), to_level.into());

        AdaptationAction {
            action_type: ActionType::Difficulty,
            intensity: (magnitude as f64 / 2.0).min(1.0),
            trigger,
            confidence,
            urgency,
            timing: ActionTiming::Immediate,
            parameters,
            expected_duration_ms: 0,
            success_criteria: vec![
                "success rate stays within the rollback threshold of baseline".to_string(),
            ],
            risk,
            rollback_threshold: risk.rollback_threshold(),
        }
    }

    fn support_action(
        &self,
        action_type: ActionType,
        intensity: f64,
        trigger: AdaptationTrigger,
        confidence: f64,
        urgency: Urgency,
        timing: ActionTiming,
    ) -> AdaptationAction {
        AdaptationAction {
            action_type,
            intensity: intensity.clamp(0.0, 1.0),
            trigger,
            confidence,
            urgency,
            timing,
            parameters: serde_json::Map::new(),
            expected_duration_ms: 0,
            success_criteria: Vec::new(),
            risk: RiskLevel::Low,
            rollback_threshold: RiskLevel::Low.rollback_threshold(),
        }
    }

    fn classify_risk(&self, magnitude: i32, confidence: f64) -> RiskLevel {
        if magnitude >= self.config.high_risk_magnitude {
            RiskLevel::High
        } else if magnitude == 1 && confidence < self.config.confidence_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Fixed priority table first, confidence second; one action per type.
    fn rank_and_dedup(mut candidates: Vec<AdaptationAction>) -> Vec<AdaptationAction> {
        candidates.sort_by(|a, b| {
            b.action_type
                .priority()
                .cmp(&a.action_type.priority())
                .then(b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
        });
        let mut seen = std::collections::HashSet::new();
        candidates.retain(|a| seen.insert(a.action_type));
        candidates
    }
}

fn clamp_span_factor(span_seconds: f64) -> f64 {
    (span_seconds / 60.0).clamp(0.0, 1.0)
}
