//! Last-good dataset and last refresh failure.

use atsiuntimas::ScheduleDataset;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{LocalStore, StoreError, KEY_DATASET, KEY_FAILURE};

/// The most recent refresh error, kept until the next successful save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    pub message: String,
    /// RFC 3339 timestamp (UTC)
    pub at: String,
}

pub struct ScheduleCache<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LocalStore + ?Sized> ScheduleCache<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Replace the cached dataset and clear any recorded failure.
    ///
    /// Only the dataset write can fail the save; once it is on disk a stale
    /// failure record is logged and left behind.
    pub fn save(&self, dataset: &ScheduleDataset) -> Result<(), StoreError> {
        let json = serde_json::to_string(dataset)?;
        self.store.set(KEY_DATASET, &json)?;
        if let Err(e) = self.store.remove(KEY_FAILURE) {
            warn!(error = %e, "Failed to clear the last refresh failure");
        }
        debug!(teachers = dataset.teachers.len(), "Dataset cached");
        Ok(())
    }

    /// The cached dataset, or `None` if absent or unreadable.
    pub fn load(&self) -> Option<ScheduleDataset> {
        let raw = read_key(self.store, KEY_DATASET)?;
        match serde_json::from_str(&raw) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                warn!(error = %e, "Cached dataset is corrupt, ignoring it");
                None
            }
        }
    }

    pub fn record_failure(&self, message: &str) -> Result<(), StoreError> {
        let record = FailureRecord {
            message: message.to_string(),
            at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.set(KEY_FAILURE, &serde_json::to_string(&record)?)
    }

    pub fn last_failure(&self) -> Option<FailureRecord> {
        let raw = read_key(self.store, KEY_FAILURE)?;
        serde_json::from_str(&raw).ok()
    }
}

fn read_key<S: LocalStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read cached value");
            None
        }
    }
}
