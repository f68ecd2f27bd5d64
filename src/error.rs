use thiserror::Error;

use crate::types::ActionType;

/// Engine-local failures. All detector-level conditions (insufficient data,
/// sub-threshold confidence) are values, not errors; the worst outcome of any
/// cycle is "no adaptation applied", which is always safe.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("action {action_type:?} is missing required parameter {parameter}")]
    MissingParameter {
        action_type: ActionType,
        parameter: &'static str,
    },

    #[error("target level {level} is outside the valid [1, 10] band")]
    LevelOutOfRange { level: i64 },

    #[error("no profile exists for user {user_id} subject {subject}")]
    ProfileNotFound { user_id: String, subject: String },

    #[error("snapshot could not be serialized: {0}")]
    Snapshot(#[from] serde_json::Error),
}
