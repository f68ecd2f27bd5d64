//! Property-based tests for the persistence contract.
//!
//! Invariants:
//! - Profile round-trip: serializing a snapshot and reading it back preserves
//!   every field a host could persist.
//! - Sanitization: arbitrary telemetry always lands inside the documented
//!   bands after the ingestion boundary.

use proptest::prelude::*;

use adapt_engine::sanitize::sanitize_point;
use adapt_engine::{
    AdjustmentTrigger, DeviceType, DifficultyAdjustment, DifficultyProfile, PerformancePoint,
    PointContext, ProfileSnapshot, TimeOfDay,
};

fn arb_unit() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_level() -> impl Strategy<Value = i32> {
    1i32..=10i32
}

fn arb_time_of_day() -> impl Strategy<Value = TimeOfDay> {
    prop_oneof![
        Just(TimeOfDay::Morning),
        Just(TimeOfDay::Afternoon),
        Just(TimeOfDay::Evening),
        Just(TimeOfDay::Night),
    ]
}

fn arb_adjustment_trigger() -> impl Strategy<Value = AdjustmentTrigger> {
    prop_oneof![
        Just(AdjustmentTrigger::Performance),
        Just(AdjustmentTrigger::Time),
        Just(AdjustmentTrigger::Plateau),
        Just(AdjustmentTrigger::Manual),
        Just(AdjustmentTrigger::AiRecommendation),
    ]
}

fn arb_point() -> impl Strategy<Value = PerformancePoint> {
    (
        0i64..=i64::MAX / 2,                 // timestamp
        "[a-z0-9-]{4,12}",                   // content_id
        arb_level(),
        any::<bool>(),                       // success
        1i32..=10i32,                        // attempts
        0.0f64..=3600.0f64,                  // time_spent_seconds
        proptest::option::of(arb_unit()),    // score
        arb_time_of_day(),
        0.0f64..=480.0f64,                   // session_duration_minutes
        arb_unit(),                          // distraction_level
    )
        .prop_map(
            |(
                timestamp,
                content_id,
                difficulty_level,
                success,
                attempts,
                time_spent_seconds,
                score,
                time_of_day,
                session_duration_minutes,
                distraction_level,
            )| PerformancePoint {
                timestamp,
                content_id,
                difficulty_level,
                success,
                attempts,
                time_spent_seconds,
                score,
                context: PointContext {
                    time_of_day,
                    session_duration_minutes,
                    device_type: DeviceType::Desktop,
                    distraction_level,
                },
            },
        )
}

fn arb_adjustment() -> impl Strategy<Value = DifficultyAdjustment> {
    (
        0i64..=i64::MAX / 2,
        arb_level(),
        arb_level(),
        arb_adjustment_trigger(),
        arb_unit(),
        any::<bool>(),
    )
        .prop_map(
            |(timestamp, from_level, to_level, trigger, confidence, applied)| {
                DifficultyAdjustment {
                    timestamp,
                    from_level,
                    to_level,
                    reason: "adjustment".to_string(),
                    trigger,
                    confidence,
                    applied,
                }
            },
        )
}

fn arb_profile() -> impl Strategy<Value = DifficultyProfile> {
    (
        "[a-z0-9]{8,16}",                             // user_id
        "[a-z]{3,10}",                                // subject
        arb_level(),
        arb_level(),
        arb_unit(),                                   // confidence
        arb_unit(),                                   // success_rate
        (0.0f64..=10.0f64, 0.0f64..=3600.0f64),       // attempts, time
        prop::collection::vec(arb_adjustment(), 0..8),
        prop::collection::vec(arb_point(), 0..20),
    )
        .prop_map(
            |(
                user_id,
                subject,
                current_level,
                optimal_level,
                confidence,
                success_rate,
                (average_attempts, time_to_complete),
                adjustment_history,
                performance_history,
            )| {
                let mut profile = DifficultyProfile::new(&user_id, &subject);
                profile.current_level = current_level;
                profile.optimal_level = optimal_level;
                profile.confidence = confidence;
                profile.success_rate = success_rate;
                profile.average_attempts = average_attempts;
                profile.time_to_complete = time_to_complete;
                profile.adjustment_history = adjustment_history;
                profile.performance_history = performance_history;
                profile
            },
        )
}

proptest! {
    /// A persisted profile comes back field-for-field identical.
    #[test]
    fn profile_json_roundtrip(profile in arb_profile()) {
        let json = serde_json::to_value(&profile).unwrap();
        let restored: DifficultyProfile = serde_json::from_value(json).unwrap();

        prop_assert_eq!(&profile.user_id, &restored.user_id);
        prop_assert_eq!(&profile.subject, &restored.subject);
        prop_assert_eq!(profile.current_level, restored.current_level);
        prop_assert_eq!(profile.optimal_level, restored.optimal_level);
        prop_assert!((profile.confidence - restored.confidence).abs() < 1e-10);
        prop_assert!((profile.success_rate - restored.success_rate).abs() < 1e-10);
        prop_assert_eq!(profile.adjustment_history.len(), restored.adjustment_history.len());
        prop_assert_eq!(profile.performance_history.len(), restored.performance_history.len());

        for (orig, rest) in profile
            .adjustment_history
            .iter()
            .zip(restored.adjustment_history.iter())
        {
            prop_assert_eq!(orig.from_level, rest.from_level);
            prop_assert_eq!(orig.to_level, rest.to_level);
            prop_assert_eq!(orig.trigger, rest.trigger);
            prop_assert_eq!(orig.applied, rest.applied);
            prop_assert!((orig.confidence - rest.confidence).abs() < 1e-10);
        }

        for (orig, rest) in profile
            .performance_history
            .iter()
            .zip(restored.performance_history.iter())
        {
            prop_assert_eq!(orig.timestamp, rest.timestamp);
            prop_assert_eq!(&orig.content_id, &rest.content_id);
            prop_assert_eq!(orig.success, rest.success);
            prop_assert_eq!(orig.attempts, rest.attempts);
            prop_assert_eq!(orig.context.time_of_day, rest.context.time_of_day);
        }
    }

    /// Snapshots survive a JSON round-trip with the profile intact.
    #[test]
    fn snapshot_json_roundtrip(profile in arb_profile(), taken_at in 0i64..=i64::MAX / 2) {
        let snapshot = ProfileSnapshot {
            profile,
            records: Vec::new(),
            taken_at,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: ProfileSnapshot = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(&snapshot.profile.user_id, &restored.profile.user_id);
        prop_assert_eq!(snapshot.profile.current_level, restored.profile.current_level);
        prop_assert_eq!(snapshot.taken_at, restored.taken_at);
    }

    /// Sanitized telemetry always lands inside the documented bands, even for
    /// hostile inputs.
    #[test]
    fn sanitized_point_is_in_band(
        level in -100i32..=100i32,
        attempts in -10i32..=10i32,
        time in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), -1e6f64..=1e6f64],
        distraction in -10.0f64..=10.0f64,
    ) {
        let point = PerformancePoint {
            difficulty_level: level,
            attempts,
            time_spent_seconds: time,
            context: PointContext {
                distraction_level: distraction,
                ..Default::default()
            },
            ..Default::default()
        };
        let clean = sanitize_point(&point);

        prop_assert!((1..=10).contains(&clean.difficulty_level));
        prop_assert!(clean.attempts >= 1);
        prop_assert!(clean.time_spent_seconds.is_finite() && clean.time_spent_seconds >= 0.0);
        prop_assert!((0.0..=1.0).contains(&clean.context.distraction_level));
    }
}
