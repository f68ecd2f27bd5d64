//! Cycle orchestration: Telemetry → Analyze → Detect → Decide → Execute.
//!
//! One cycle per telemetry batch. Cycles for the same (user, subject) pair are
//! serialized behind a per-user async lock; different users proceed
//! concurrently. Monitoring windows are checked cooperatively at the start of
//! each cycle, so rollback needs no background task.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::analyzer::{PerformanceAnalysis, PerformanceAnalyzer};
use crate::config::EngineConfig;
use crate::decision::{AdaptationDecisionEngine, Decision};
use crate::detectors::{
    EngagementSignal, FatigueDetector, FatigueInput, FatigueSignal, FlowSignal, FlowStateDetector,
    FrustrationDetector, FrustrationSignal, PlateauDetector, PlateauSignal,
};
use crate::error::EngineError;
use crate::executor::{AdaptationExecutor, MonitoringVerdict};
use crate::monitor::InvariantMonitor;
use crate::sanitize;
use crate::store::ProfileStore;
use crate::types::{
    clamp_level, clamp_unit, ActionTiming, ActionType, AdaptationAction, AdaptationResult,
    DifficultyProfile, MonitoringWindow, PerformancePoint, ProfileSnapshot, RealTimeContext,
};

/// Everything one cycle produced, returned to the host for transparency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub analysis: PerformanceAnalysis,
    pub flow: FlowSignal,
    pub plateau: PlateauSignal,
    pub fatigue: FatigueSignal,
    pub frustration: FrustrationSignal,
    pub engagement: EngagementSignal,
    pub decision: Decision,
    pub applied: Vec<AdaptationResult>,
    pub rollback: Option<AdaptationResult>,
    pub invariant_violations: Vec<String>,
}

/// Session-scoped state that does not belong in the profile: the open
/// monitoring window and actions deferred to a later boundary.
#[derive(Default)]
struct SessionState {
    monitoring: Option<MonitoringWindow>,
    pending: Vec<AdaptationAction>,
    last_content_id: Option<String>,
}

pub struct AdaptiveEngine {
    config: EngineConfig,
    store: Arc<dyn ProfileStore>,
    analyzer: PerformanceAnalyzer,
    flow: FlowStateDetector,
    plateau: PlateauDetector,
    fatigue: FatigueDetector,
    frustration: FrustrationDetector,
    decision: AdaptationDecisionEngine,
    executor: AdaptationExecutor,
    sessions: RwLock<HashMap<(String, String), Arc<Mutex<SessionState>>>>,
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            analyzer: PerformanceAnalyzer::new(config.analyzer.clone()),
            flow: FlowStateDetector::new(config.flow.clone()),
            plateau: PlateauDetector::new(config.plateau.clone()),
            fatigue: FatigueDetector::new(config.fatigue.clone()),
            frustration: FrustrationDetector::new(config.frustration.clone()),
            decision: AdaptationDecisionEngine::new(
                config.decision.clone(),
                config.flow.correction_gap,
            ),
            executor: AdaptationExecutor::new(config.executor.clone()),
            sessions: RwLock::new(HashMap::new()),
            store,
            config,
        }
    }

    pub fn from_env(store: Arc<dyn ProfileStore>) -> Self {
        Self::new(EngineConfig::from_env(), store)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one full adaptation cycle for a telemetry batch. An empty batch
    /// is a valid no-op cycle that still checks monitoring windows.
    pub async fn process_batch(
        &self,
        user_id: &str,
        subject: &str,
        points: &[PerformancePoint],
        context: &RealTimeContext,
    ) -> CycleResult {
        let now = chrono::Utc::now().timestamp_millis();
        self.process_batch_at(user_id, subject, points, context, now)
            .await
    }

    /// Deterministic-clock variant of [`process_batch`](Self::process_batch).
    pub async fn process_batch_at(
        &self,
        user_id: &str,
        subject: &str,
        points: &[PerformancePoint],
        context: &RealTimeContext,
        now: i64,
    ) -> CycleResult {
        let session = self.session(user_id, subject).await;
        let mut state = session.lock().await;

        let context = sanitize::sanitize_context(context);
        let mut profile = self.store.get_or_create(user_id, subject);

        for point in points {
            profile.performance_history.push(sanitize::sanitize_point(point));
        }
        let cap = self.config.executor.history_cap;
        if profile.performance_history.len() > cap {
            let excess = profile.performance_history.len() - cap;
            profile.performance_history.drain(..excess);
        }

        let window_start = profile
            .performance_history
            .len()
            .saturating_sub(self.config.analyzer.window_size);
        let window: Vec<PerformancePoint> = profile.performance_history[window_start..].to_vec();

        let analysis = self.analyzer.analyze(&window);

        let rollback = self.check_monitoring(&mut state, &mut profile, &analysis, &context, now);

        let interaction = &context.current_interaction;
        let flow = self
            .flow
            .detect(profile.current_level, &analysis, interaction.help_requests);
        let plateau = self.plateau.detect(&window, analysis.improvement_rate);
        let recent_errors = window
            .iter()
            .rev()
            .take(10)
            .filter(|p| !p.success)
            .count();
        let fatigue = self.fatigue.detect(&FatigueInput {
            session_duration_seconds: interaction.time_spent_seconds,
            recent_errors,
            time_of_day: context.environmental_factors.time_of_day,
        });
        let frustration = self.frustration.detect_frustration(interaction, now);
        let engagement = self.frustration.detect_engagement(interaction, now);

        profile.optimal_level = clamp_level(flow.skill_estimate.round() as i32);
        let evidence =
            (analysis.sample_count as f64 / self.config.analyzer.window_size as f64).min(1.0);
        profile.confidence = clamp_unit(
            DifficultyProfile::DEFAULT_CONFIDENCE
                + self.config.analyzer.confidence_gain * evidence * analysis.consistency,
        );
        profile.success_rate = analysis.success_rate;
        profile.average_attempts = analysis.average_attempts;
        profile.time_to_complete = analysis.average_time_seconds;
        profile.improvement_rate = analysis.improvement_rate;
        profile.help_requests = interaction.help_requests;
        profile.fatigue_level = fatigue.fatigue;
        profile.motivation_level = fatigue.motivation;
        profile.plateau_detected = plateau.detected;
        profile.session_quality =
            clamp_unit(0.5 * analysis.consistency + 0.5 * engagement.engagement_level);

        let decision = self.decision.decide(
            &profile,
            &analysis,
            &flow,
            &plateau,
            &fatigue,
            &frustration,
            &engagement,
        );
        debug!(
            user = user_id,
            subject,
            immediate = decision.immediate.len(),
            deferred = decision.deferred.len(),
            reasoning = decision.reasoning.as_str(),
            "cycle decided"
        );

        let mut applied = Vec::new();
        let due = self.drain_due_pending(&mut state, &context);
        for action in due.iter().chain(decision.immediate.iter()) {
            let result =
                self.apply_action(action, &mut state, &mut profile, &analysis, &context, now);
            applied.push(result);
        }

        for action in &decision.deferred {
            if action.timing != ActionTiming::Immediate {
                state.pending.retain(|p| p.action_type != action.action_type);
                state.pending.push(action.clone());
            }
        }
        state.last_content_id = Some(context.content_id.clone());

        self.store.save(&profile);

        let mut result = CycleResult {
            analysis,
            flow,
            plateau,
            fatigue,
            frustration,
            engagement,
            decision,
            applied,
            rollback,
            invariant_violations: Vec::new(),
        };
        result.invariant_violations = InvariantMonitor::check(&profile, &result);
        result
    }

    /// Discards the open monitoring window and deferred actions without a
    /// rollback; a user ending a session is not a performance signal.
    pub async fn end_session(&self, user_id: &str, subject: &str) {
        let session = self.session(user_id, subject).await;
        let mut state = session.lock().await;
        state.monitoring = None;
        state.pending.clear();
        state.last_content_id = None;
    }

    /// Serializable view of the profile plus audit trail for the host's
    /// persistence layer.
    pub fn snapshot(&self, user_id: &str, subject: &str) -> Result<ProfileSnapshot, EngineError> {
        let profile =
            self.store
                .get(user_id, subject)
                .ok_or_else(|| EngineError::ProfileNotFound {
                    user_id: user_id.to_string(),
                    subject: subject.to_string(),
                })?;
        let records = self.store.list_history(user_id, subject);
        Ok(ProfileSnapshot {
            profile,
            records,
            taken_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    pub fn restore(&self, snapshot: ProfileSnapshot) {
        self.store.restore(snapshot.profile, snapshot.records);
    }

    async fn session(&self, user_id: &str, subject: &str) -> Arc<Mutex<SessionState>> {
        let key = (user_id.to_string(), subject.to_string());
        {
            let sessions = self.sessions.read().await;
            if let Some(state) = sessions.get(&key) {
                return Arc::clone(state);
            }
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(key).or_default())
    }

    fn check_monitoring(
        &self,
        state: &mut SessionState,
        profile: &mut DifficultyProfile,
        analysis: &PerformanceAnalysis,
        context: &RealTimeContext,
        now: i64,
    ) -> Option<AdaptationResult> {
        let window = state.monitoring.take()?;
        match self.executor.check_monitoring(
            &window,
            profile,
            analysis.success_rate,
            context,
            now,
        ) {
            MonitoringVerdict::StillOpen => {
                state.monitoring = Some(window);
                None
            }
            MonitoringVerdict::Resolved { effectiveness } => {
                self.store.set_record_effectiveness(
                    &profile.user_id,
                    &profile.subject,
                    window.record_index,
                    effectiveness,
                );
                None
            }
            MonitoringVerdict::RolledBack {
                result,
                rollback_record,
            } => {
                self.store.set_record_effectiveness(
                    &profile.user_id,
                    &profile.subject,
                    window.record_index,
                    0.0,
                );
                self.store
                    .append_record(&profile.user_id, &profile.subject, rollback_record);
                Some(result)
            }
        }
    }

    fn apply_action(
        &self,
        action: &AdaptationAction,
        state: &mut SessionState,
        profile: &mut DifficultyProfile,
        analysis: &PerformanceAnalysis,
        context: &RealTimeContext,
        now: i64,
    ) -> AdaptationResult {
        let previous_level = profile.current_level;
        match self.executor.execute(action, profile, context, now) {
            Ok(execution) => {
                let record_index = self.store.append_record(
                    &profile.user_id,
                    &profile.subject,
                    execution.record,
                );
                if action.action_type == ActionType::Difficulty {
                    state.monitoring = Some(self.executor.open_window(
                        action,
                        analysis.success_rate,
                        previous_level,
                        &context.session_id,
                        record_index,
                        now,
                    ));
                }
                execution.result
            }
            Err(error) => AdaptationExecutor::unavailable(action, &error),
        }
    }

    /// Deferred actions whose boundary has arrived: every cycle is a new
    /// interaction, and a changed content id is a content boundary.
    fn drain_due_pending(
        &self,
        state: &mut SessionState,
        context: &RealTimeContext,
    ) -> Vec<AdaptationAction> {
        let content_changed = state
            .last_content_id
            .as_deref()
            .map(|id| id != context.content_id)
            .unwrap_or(false);

        let mut due = Vec::new();
        state.pending.retain(|action| match action.timing {
            ActionTiming::NextInteraction => {
                due.push(action.clone());
                false
            }
            ActionTiming::NextContent if content_changed => {
                due.push(action.clone());
                false
            }
            _ => true,
        });
        due
    }
}
