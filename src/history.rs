use serde::{Deserialize, Serialize};

use crate::types::AdaptationRecord;

/// Append-only audit trail of applied adaptations for one (user, subject)
/// pair. Rollbacks append new records; nothing is ever rewritten, only the
/// `effectiveness` slot of a record is filled in when its monitoring window
/// resolves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationHistoryLog {
    records: Vec<AdaptationRecord>,
}

impl AdaptationHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its index, used by monitoring windows to
    /// locate the record they resolve.
    pub fn append(&mut self, record: AdaptationRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn set_effectiveness(&mut self, index: usize, effectiveness: f64) {
        if let Some(record) = self.records.get_mut(index) {
            record.effectiveness = Some(effectiveness);
        }
    }

    pub fn records(&self) -> &[AdaptationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn restore(records: Vec<AdaptationRecord>) -> Self {
        Self { records }
    }
}
