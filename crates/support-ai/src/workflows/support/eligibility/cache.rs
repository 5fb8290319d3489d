use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::EligibilityAssessment;

struct CacheEntry {
    assessment: EligibilityAssessment,
    stored_at: DateTime<Utc>,
}

/// TTL cache keyed by feature fingerprint. Entries older than the TTL are
/// treated as absent and evicted on access.
pub struct AssessmentCache {
    ttl: Duration,
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl AssessmentCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, fingerprint: u64) -> Option<EligibilityAssessment> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(&fingerprint) {
            Some(entry) if Utc::now() - entry.stored_at <= self.ttl => {
                Some(entry.assessment.clone())
            }
            Some(_) => {
                entries.remove(&fingerprint);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, fingerprint: u64, assessment: EligibilityAssessment) {
        self.insert_stored_at(fingerprint, assessment, Utc::now());
    }

    pub fn remove(&self, fingerprint: u64) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.remove(&fingerprint);
    }

    pub fn clear(&self) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    fn insert_stored_at(
        &self,
        fingerprint: u64,
        assessment: EligibilityAssessment,
        stored_at: DateTime<Utc>,
    ) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(
            fingerprint,
            CacheEntry {
                assessment,
                stored_at,
            },
        );
    }

    /// Backdates an entry so expiry can be exercised without sleeping.
    #[cfg(test)]
    pub fn insert_at(
        &self,
        fingerprint: u64,
        assessment: EligibilityAssessment,
        stored_at: DateTime<Utc>,
    ) {
        self.insert_stored_at(fingerprint, assessment, stored_at);
    }
}
