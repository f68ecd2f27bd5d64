//! Profile storage seam.
//!
//! The engine never does I/O; hosts hand it a [`ProfileStore`] and wire the
//! in-memory implementation, a database, or a cache behind the same trait.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::history::AdaptationHistoryLog;
use crate::types::{AdaptationRecord, DifficultyProfile};

pub trait ProfileStore: Send + Sync {
    /// Fetches the profile, creating it with the documented defaults on first
    /// access. Creation is idempotent.
    fn get_or_create(&self, user_id: &str, subject: &str) -> DifficultyProfile;

    /// Fetches without creating; `None` when the pair has never been seen.
    fn get(&self, user_id: &str, subject: &str) -> Option<DifficultyProfile>;

    fn save(&self, profile: &DifficultyProfile);

    /// Appends to the (user, subject) audit log and returns the record index.
    fn append_record(&self, user_id: &str, subject: &str, record: AdaptationRecord) -> usize;

    fn set_record_effectiveness(
        &self,
        user_id: &str,
        subject: &str,
        index: usize,
        effectiveness: f64,
    );

    fn list_history(&self, user_id: &str, subject: &str) -> Vec<AdaptationRecord>;

    /// Replaces the stored profile and audit log wholesale, used when a host
    /// rehydrates state from its own persistence layer.
    fn restore(&self, profile: DifficultyProfile, records: Vec<AdaptationRecord>);
}

struct StoreEntry {
    profile: DifficultyProfile,
    log: AdaptationHistoryLog,
}

impl StoreEntry {
    fn new(user_id: &str, subject: &str) -> Self {
        Self {
            profile: DifficultyProfile::new(user_id, subject),
            log: AdaptationHistoryLog::new(),
        }
    }
}

/// Process-local store keyed by (user_id, subject).
#[derive(Default)]
pub struct InMemoryProfileStore {
    entries: RwLock<HashMap<(String, String), StoreEntry>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str, subject: &str) -> (String, String) {
        (user_id.to_string(), subject.to_string())
    }

    /// Drops all state. Test helper.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get_or_create(&self, user_id: &str, subject: &str) -> DifficultyProfile {
        let key = Self::key(user_id, subject);
        let mut entries = self.entries.write();
        entries
            .entry(key)
            .or_insert_with(|| StoreEntry::new(user_id, subject))
            .profile
            .clone()
    }

    fn get(&self, user_id: &str, subject: &str) -> Option<DifficultyProfile> {
        let key = Self::key(user_id, subject);
        self.entries.read().get(&key).map(|e| e.profile.clone())
    }

    fn save(&self, profile: &DifficultyProfile) {
        let key = Self::key(&profile.user_id, &profile.subject);
        let mut entries = self.entries.write();
        let entry = entries
            .entry(key)
            .or_insert_with(|| StoreEntry::new(&profile.user_id, &profile.subject));
        entry.profile = profile.clone();
    }

    fn append_record(&self, user_id: &str, subject: &str, record: AdaptationRecord) -> usize {
        let key = Self::key(user_id, subject);
        let mut entries = self.entries.write();
        entries
            .entry(key)
            .or_insert_with(|| StoreEntry::new(user_id, subject))
            .log
            .append(record)
    }

    fn set_record_effectiveness(
        &self,
        user_id: &str,
        subject: &str,
        index: usize,
        effectiveness: f64,
    ) {
        let key = Self::key(user_id, subject);
        if let Some(entry) = self.entries.write().get_mut(&key) {
            entry.log.set_effectiveness(index, effectiveness);
        }
    }

    fn list_history(&self, user_id: &str, subject: &str) -> Vec<AdaptationRecord> {
        let key = Self::key(user_id, subject);
        self.entries
            .read()
            .get(&key)
            .map(|e| e.log.records().to_vec())
            .unwrap_or_default()
    }

    fn restore(&self, profile: DifficultyProfile, records: Vec<AdaptationRecord>) {
        let key = Self::key(&profile.user_id, &profile.subject);
        self.entries.write().insert(
            key,
            StoreEntry {
                profile,
                log: AdaptationHistoryLog::restore(records),
            },
        );
    }
}
