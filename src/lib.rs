//! Adaptive difficulty and real-time behavioral adaptation engine.
//!
//! Maintains a per-(user, subject) difficulty profile, analyzes batches of
//! performance telemetry, runs flow/plateau/fatigue/frustration detectors,
//! and turns their signals into bounded, explainable adaptation actions with
//! monitoring windows and automatic rollback.
//!
//! The crate is a pure decision library: no UI, no persistence I/O, no
//! network. Hosts inject a [`store::ProfileStore`] and consume the data-only
//! [`types::AdaptationResult`] descriptors each cycle returns.

pub mod analyzer;
pub mod config;
pub mod decision;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod executor;
pub mod explain;
pub mod history;
pub mod monitor;
pub mod sanitize;
pub mod store;
pub mod types;

pub use analyzer::{PerformanceAnalysis, PerformanceAnalyzer, Trend};
pub use config::EngineConfig;
pub use decision::{AdaptationDecisionEngine, Decision};
pub use detectors::{
    EngagementSignal, FatigueDetector, FatigueInput, FatigueSignal, FlowSignal, FlowStateDetector,
    FrustrationDetector, FrustrationSignal, PlateauDetector, PlateauSignal,
};
pub use engine::{AdaptiveEngine, CycleResult};
pub use error::EngineError;
pub use executor::{AdaptationExecutor, Execution, MonitoringVerdict};
pub use history::AdaptationHistoryLog;
pub use monitor::InvariantMonitor;
pub use store::{InMemoryProfileStore, ProfileStore};
pub use types::{
    AdaptationAction, AdaptationRecord, AdaptationResult, AdaptationTrigger, ActionTiming,
    ActionType, AdjustmentTrigger, ClickEvent, ContentRequest, DeviceType, DifficultyAdjustment,
    DifficultyProfile, EnvironmentalFactors, FrustrationIndicator, FrustrationKind,
    InteractionState, MonitoringWindow, NetworkQuality, PauseEvent, PerformancePoint, PointContext,
    ProfileSnapshot, RealTimeContext, RiskLevel, ScrollPattern, TimeOfDay, Urgency, VisualFeedback,
};
